//! Output primitives and their replaceable slots.
//!
//! Each primitive is a single slot holding the implementation currently in
//! effect on this execution context. [`install`] swaps in replacements and
//! returns a [`PrimitiveGuard`] that puts back the values of exactly those
//! slots when dropped, so nested installs unwind in reverse order even
//! during a panic.
//!
//! The `original_*` functions are the pristine implementations. They are
//! plain functions and can never be replaced, so a replacement that needs
//! the real behavior calls them directly instead of going back through a
//! slot.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use super::format::{format_message, Value};
use super::{with_host, HOST};
use crate::error::BeQuietError;
use crate::Result;

/// Name of the visible buffer that logs every displayed status message.
pub const MESSAGES_BUFFER: &str = "*Messages*";

/// Implementation of the status-message primitive.
pub type MessageFn = Rc<dyn Fn(Option<&str>, &[Value]) -> Result<Option<String>>>;

/// Implementation of the generic output destination.
pub type OutputFn = Rc<dyn Fn(&OutputUnit)>;

/// Implementation of the file-write primitive.
pub type WriteRegionFn = Rc<dyn Fn(&WriteRequest) -> Result<()>>;

/// Implementation of the module-load primitive.
pub type LoadFn = Rc<dyn Fn(&Path, LoadOptions) -> Result<bool>>;

/// One unit of generic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputUnit {
    /// A single character.
    Char(char),
    /// A run of text.
    Text(String),
}

impl OutputUnit {
    /// Borrow the unit as text, encoding a character into `buf`.
    pub fn as_str<'a>(&'a self, buf: &'a mut [u8; 4]) -> &'a str {
        match self {
            OutputUnit::Char(c) => &*c.encode_utf8(buf),
            OutputUnit::Text(s) => s.as_str(),
        }
    }
}

/// How a file write reports itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteNotify {
    /// Show a `Wrote <file>` status message.
    #[default]
    Display,
    /// Write without any status message.
    Silent,
}

/// A request to write text to a file.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Destination file.
    pub path: PathBuf,
    /// Text to write.
    pub text: String,
    /// Append instead of replacing the file contents.
    pub append: bool,
    /// Notification mode.
    pub notify: WriteNotify,
}

impl WriteRequest {
    /// Create a request that replaces `path` with `text`.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            append: false,
            notify: WriteNotify::Display,
        }
    }

    /// Append to the file instead of replacing it.
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    /// Set the notification mode.
    pub fn with_notify(mut self, notify: WriteNotify) -> Self {
        self.notify = notify;
        self
    }
}

/// Options for loading a module file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Return `Ok(false)` instead of failing when the file does not exist.
    pub noerror: bool,
    /// Suppress the `Loading ...` status messages.
    pub nomessage: bool,
}

/// The slot table of one execution context.
pub(crate) struct Primitives {
    message: MessageFn,
    standard_output: OutputFn,
    write_region: WriteRegionFn,
    load: LoadFn,
    inhibit_message: bool,
}

impl Default for Primitives {
    fn default() -> Self {
        let message: MessageFn = Rc::new(original_message);
        let standard_output: OutputFn = Rc::new(stdout_output);
        let write_region: WriteRegionFn = Rc::new(original_write_region);
        let load: LoadFn = Rc::new(original_load);
        Self {
            message,
            standard_output,
            write_region,
            load,
            inhibit_message: false,
        }
    }
}

/// A set of replacements to install. Unset fields keep their current value.
#[derive(Clone, Default)]
pub struct Overrides {
    message: Option<MessageFn>,
    standard_output: Option<OutputFn>,
    write_region: Option<WriteRegionFn>,
    load: Option<LoadFn>,
    inhibit_message: Option<bool>,
}

impl Overrides {
    /// Create an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status-message primitive.
    pub fn message(
        mut self,
        f: impl Fn(Option<&str>, &[Value]) -> Result<Option<String>> + 'static,
    ) -> Self {
        self.message = Some(Rc::new(f));
        self
    }

    /// Replace the generic output destination.
    pub fn standard_output(mut self, f: impl Fn(&OutputUnit) + 'static) -> Self {
        self.standard_output = Some(Rc::new(f));
        self
    }

    /// Replace the file-write primitive.
    pub fn write_region(mut self, f: impl Fn(&WriteRequest) -> Result<()> + 'static) -> Self {
        self.write_region = Some(Rc::new(f));
        self
    }

    /// Replace the module-load primitive.
    pub fn load(mut self, f: impl Fn(&Path, LoadOptions) -> Result<bool> + 'static) -> Self {
        self.load = Some(Rc::new(f));
        self
    }

    /// Set the inhibit-status-display flag.
    pub fn inhibit_message(mut self, inhibit: bool) -> Self {
        self.inhibit_message = Some(inhibit);
        self
    }
}

/// Puts back the slots replaced by [`install`] when dropped.
///
/// Only the slots named in the installed [`Overrides`] are restored; the
/// rest of the table is left as whatever is current at drop time.
#[must_use = "the overrides are removed as soon as the guard is dropped"]
pub struct PrimitiveGuard {
    displaced: Option<Overrides>,
}

impl Drop for PrimitiveGuard {
    fn drop(&mut self) {
        let Some(displaced) = self.displaced.take() else {
            return;
        };
        // The host may already be gone during thread teardown.
        match HOST.try_with(|h| {
            swap_slots(&mut h.primitives.borrow_mut(), displaced);
        }) {
            Ok(()) => trace!("primitives restored"),
            Err(_) => trace!("host already destroyed, primitives not restored"),
        }
    }
}

/// Install `overrides` on the current execution context.
pub fn install(overrides: Overrides) -> PrimitiveGuard {
    let displaced = with_host(|h| swap_slots(&mut h.primitives.borrow_mut(), overrides));
    trace!("primitives installed");
    PrimitiveGuard {
        displaced: Some(displaced),
    }
}

/// Store every set field of `overrides` in `slots` and return the values
/// they replaced, in the same shape.
fn swap_slots(slots: &mut Primitives, overrides: Overrides) -> Overrides {
    Overrides {
        message: overrides
            .message
            .map(|f| std::mem::replace(&mut slots.message, f)),
        standard_output: overrides
            .standard_output
            .map(|f| std::mem::replace(&mut slots.standard_output, f)),
        write_region: overrides
            .write_region
            .map(|f| std::mem::replace(&mut slots.write_region, f)),
        load: overrides
            .load
            .map(|f| std::mem::replace(&mut slots.load, f)),
        inhibit_message: overrides
            .inhibit_message
            .map(|inhibit| std::mem::replace(&mut slots.inhibit_message, inhibit)),
    }
}

// Slot lookups clone the Rc out so no borrow is held while the
// implementation runs; implementations are free to install or call again.

fn current_message_fn() -> MessageFn {
    with_host(|h| h.primitives.borrow().message.clone())
}

fn current_output_fn() -> OutputFn {
    with_host(|h| h.primitives.borrow().standard_output.clone())
}

fn current_write_region_fn() -> WriteRegionFn {
    with_host(|h| h.primitives.borrow().write_region.clone())
}

fn current_load_fn() -> LoadFn {
    with_host(|h| h.primitives.borrow().load.clone())
}

/// Display a status message.
///
/// With `None` as the format nothing is formatted and `Ok(None)` is returned.
/// Otherwise the formatted text is returned.
pub fn message(format: Option<&str>, args: &[Value]) -> Result<Option<String>> {
    current_message_fn()(format, args)
}

/// Send one unit to the current output destination.
pub fn print_unit(unit: OutputUnit) {
    current_output_fn()(&unit)
}

/// Send text to the current output destination.
pub fn princ(text: &str) {
    print_unit(OutputUnit::Text(text.to_string()))
}

/// Send a single character to the current output destination.
pub fn write_char(c: char) {
    print_unit(OutputUnit::Char(c))
}

/// Send the quoted form of `value` to the current output destination.
pub fn prin1(value: &Value) {
    print_unit(OutputUnit::Text(value.quoted()))
}

/// Write text to a file.
pub fn write_region(request: &WriteRequest) -> Result<()> {
    current_write_region_fn()(request)
}

/// Load a module file. Returns `Ok(false)` only for a missing file with
/// `noerror` set.
pub fn load(path: &Path, options: LoadOptions) -> Result<bool> {
    current_load_fn()(path, options)
}

/// Run `body` with generic output sent to `destination`.
pub fn with_standard_output<T>(
    destination: impl Fn(&OutputUnit) + 'static,
    body: impl FnOnce() -> T,
) -> T {
    let _guard = install(Overrides::new().standard_output(destination));
    body()
}

/// Log `text` to the messages buffer and, unless status display is
/// inhibited, show it on stderr.
///
/// This is the low-level display path. It does not go through the message
/// slot.
pub fn echo_status(text: &str) {
    let shown = with_host(|h| {
        let log = h.buffers.get_buffer_create(MESSAGES_BUFFER);
        h.buffers.append(log, text);
        h.buffers.append(log, "\n");
        if let Some(max) = h.message_log_max.get() {
            h.buffers.keep_last_lines(log, max);
        }

        if h.primitives.borrow().inhibit_message {
            false
        } else {
            *h.current_message.borrow_mut() = Some(text.to_string());
            true
        }
    });
    if shown {
        eprintln!("{text}");
    }
}

/// The unintercepted status-message primitive.
pub fn original_message(format: Option<&str>, args: &[Value]) -> Result<Option<String>> {
    let Some(format) = format else {
        clear_current_message();
        return Ok(None);
    };

    let text = format_message(format, args)?;
    if text.is_empty() {
        clear_current_message();
    } else {
        echo_status(&text);
    }
    Ok(Some(text))
}

/// The unintercepted file-write primitive.
pub fn original_write_region(request: &WriteRequest) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true);
    if request.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    let mut file = options.open(&request.path)?;
    file.write_all(request.text.as_bytes())?;
    debug!(path = %request.path.display(), bytes = request.text.len(), "region written");

    if request.notify == WriteNotify::Display {
        echo_status(&format!("Wrote {}", request.path.display()));
    }
    Ok(())
}

/// The unintercepted module-load primitive.
///
/// Reads the module, records it in the load history and runs the after-load
/// hooks.
pub fn original_load(path: &Path, options: LoadOptions) -> Result<bool> {
    // Read as bytes: the module text is never evaluated.
    let source = match fs::read(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if options.noerror {
                return Ok(false);
            }
            return Err(BeQuietError::LoadFailed(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if !options.nomessage {
        echo_status(&format!("Loading {}...", path.display()));
    }

    let hooks = with_host(|h| {
        let mut history = h.load_history.borrow_mut();
        history.retain(|loaded| loaded != path);
        history.push(path.to_path_buf());
        drop(history);
        h.after_load_hooks.borrow().clone()
    });
    debug!(path = %path.display(), bytes = source.len(), "module loaded");
    for hook in hooks {
        hook(path);
    }

    if !options.nomessage {
        echo_status(&format!("Loading {}...done", path.display()));
    }
    Ok(true)
}

fn stdout_output(unit: &OutputUnit) {
    let mut buf = [0u8; 4];
    print!("{}", unit.as_str(&mut buf));
}

fn clear_current_message() {
    with_host(|h| *h.current_message.borrow_mut() = None);
}

/// Register a hook run after every successful load.
pub fn add_after_load_hook(hook: impl Fn(&Path) + 'static) {
    with_host(|h| h.after_load_hooks.borrow_mut().push(Rc::new(hook)));
}

/// Files loaded on this execution context, least recently loaded first.
///
/// Reloading a file moves it to the end, so the history holds one entry per
/// distinct file and grows only with the number of files.
pub fn load_history() -> Vec<PathBuf> {
    with_host(|h| h.load_history.borrow().clone())
}

/// Default cap on the number of lines kept in the messages buffer.
pub const DEFAULT_MESSAGE_LOG_MAX: usize = 1000;

/// Cap the messages buffer at `max` lines on this execution context,
/// dropping the oldest lines first. `None` keeps every line.
pub fn set_message_log_max(max: Option<usize>) {
    with_host(|h| {
        h.message_log_max.set(max);
        if let (Some(max), Some(log)) = (max, h.buffers.find_by_name(MESSAGES_BUFFER)) {
            h.buffers.keep_last_lines(log, max);
        }
    });
}

/// The current cap on the messages buffer.
pub fn message_log_max() -> Option<usize> {
    with_host(|h| h.message_log_max.get())
}

/// The lines logged to the messages buffer and still within the cap.
pub fn messages_log() -> String {
    with_host(|h| {
        h.buffers
            .find_by_name(MESSAGES_BUFFER)
            .and_then(|id| h.buffers.contents(id))
            .unwrap_or_default()
    })
}

/// The status message currently on display.
pub fn current_message() -> Option<String> {
    with_host(|h| h.current_message.borrow().clone())
}

/// Whether status display is inhibited on this execution context.
pub fn inhibit_message() -> bool {
    with_host(|h| h.primitives.borrow().inhibit_message)
}
