//! The host environment that quiet scopes run against.
//!
//! The host provides the output primitives, text buffers and a function
//! table with advice. Its state is per execution context: each thread owns
//! an independent host, and everything installed on one thread is invisible
//! to the others.
//!
//! # Example
//!
//! ```
//! use be_quiet::host::{self, Value};
//!
//! host::defun("greet", |args| {
//!     host::message(Some("hello %s"), args)?;
//!     Ok(Value::Nil)
//! });
//! host::funcall("greet", &[Value::from("world")]).unwrap();
//! assert!(host::messages_log().contains("hello world"));
//! ```

mod buffer;
mod format;
mod function;
mod primitives;

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub use buffer::{Buffer, BufferId, BufferStore};
pub use format::{format_message, Value};
pub use function::{Advice, AdviceId, AroundFn, Function, FunctionTable};
pub use primitives::{
    add_after_load_hook, current_message, echo_status, inhibit_message, install, load,
    load_history, message, message_log_max, messages_log, original_load, original_message,
    original_write_region, prin1, princ, print_unit, set_message_log_max, with_standard_output,
    write_char, write_region, LoadFn, LoadOptions, MessageFn, OutputFn, OutputUnit, Overrides,
    PrimitiveGuard, WriteNotify, WriteRegionFn, WriteRequest, DEFAULT_MESSAGE_LOG_MAX,
    MESSAGES_BUFFER,
};

use crate::Result;

/// Host state of one execution context.
pub(crate) struct HostState {
    pub(crate) buffers: BufferStore,
    pub(crate) primitives: RefCell<primitives::Primitives>,
    pub(crate) functions: FunctionTable,
    pub(crate) load_history: RefCell<Vec<PathBuf>>,
    pub(crate) after_load_hooks: RefCell<Vec<Rc<dyn Fn(&Path)>>>,
    pub(crate) current_message: RefCell<Option<String>>,
    pub(crate) message_log_max: Cell<Option<usize>>,
}

impl HostState {
    fn new() -> Self {
        Self {
            buffers: BufferStore::new(),
            primitives: RefCell::new(primitives::Primitives::default()),
            functions: FunctionTable::new(),
            load_history: RefCell::new(Vec::new()),
            after_load_hooks: RefCell::new(Vec::new()),
            current_message: RefCell::new(None),
            message_log_max: Cell::new(Some(primitives::DEFAULT_MESSAGE_LOG_MAX)),
        }
    }
}

thread_local! {
    pub(crate) static HOST: HostState = HostState::new();
}

pub(crate) fn with_host<R>(f: impl FnOnce(&HostState) -> R) -> R {
    HOST.with(f)
}

/// Create a buffer named after `name`, made unique if needed.
pub fn generate_new_buffer(name: &str) -> BufferId {
    with_host(|h| h.buffers.generate_new_buffer(name))
}

/// Append text to a buffer. A no-op on a killed buffer.
pub fn buffer_append(id: BufferId, text: &str) -> bool {
    with_host(|h| h.buffers.append(id, text))
}

/// Text of a buffer, or `None` if it has been killed.
pub fn buffer_string(id: BufferId) -> Option<String> {
    with_host(|h| h.buffers.contents(id))
}

/// Name of a buffer, or `None` if it has been killed.
pub fn buffer_name(id: BufferId) -> Option<String> {
    with_host(|h| h.buffers.name(id))
}

/// Kill a buffer. Returns `false` if it was already dead.
pub fn kill_buffer(id: BufferId) -> bool {
    with_host(|h| h.buffers.kill(id))
}

/// Check whether a buffer is live.
pub fn buffer_live_p(id: BufferId) -> bool {
    with_host(|h| h.buffers.is_live(id))
}

/// Names of the live buffers a user would see. Hidden buffers are omitted.
pub fn buffer_list() -> Vec<String> {
    with_host(|h| h.buffers.list_visible())
}

/// Define `name` in the function table.
pub fn defun(name: &str, f: impl Fn(&[Value]) -> Result<Value> + 'static) {
    with_host(|h| h.functions.defun(name, f))
}

/// Call `name` through its advice.
pub fn funcall(name: &str, args: &[Value]) -> Result<Value> {
    with_host(|h| h.functions.funcall(name, args))
}

/// Add advice to `name`. Returns `false` if it was already there.
pub fn advice_add(name: &str, advice: Advice) -> bool {
    with_host(|h| h.functions.advice_add(name, advice))
}

/// Remove advice `id` from `name`. Returns `false` if it was not there.
pub fn advice_remove(name: &str, id: AdviceId) -> bool {
    with_host(|h| h.functions.advice_remove(name, id))
}

/// Check whether advice `id` is on `name`.
pub fn advice_member_p(name: &str, id: AdviceId) -> bool {
    with_host(|h| h.functions.advice_member_p(name, id))
}
