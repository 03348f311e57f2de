//! # be-quiet
//!
//! Scoped suppression of status messages and printed output.
//!
//! This crate temporarily redirects the output primitives of a host
//! environment (status messages, generic print output, file-write
//! notifications and module-load notifications) into a hidden in-memory
//! sink, and restores them afterwards even if the body panics.
//!
//! ## Features
//!
//! - **Capturing scopes**: [`run_quietly`] exposes the captured text to the body
//! - **Nesting**: inner scopes get their own sink and restore the outer one
//! - **Quiet calls**: [`funcall_quietly`] discards output around any call
//! - **Advice**: [`advice_add`] makes every call of a named function quiet
//! - **Kill switch**: [`set_disabled`] turns all of it into pass-through
//!
//! ## Quick Start
//!
//! ```
//! use be_quiet::{host, run_quietly};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("notes.txt");
//!
//! let result = run_quietly(|scope| {
//!     host::write_region(&host::WriteRequest::new(&path, "saved")).unwrap();
//!     host::message(Some("progress %d%%"), &[host::Value::from(50)]).unwrap();
//!     scope.output()
//! });
//!
//! assert_eq!(result, "progress 50%\n");
//! assert_eq!(std::fs::read_to_string(&path).unwrap(), "saved");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod quiet;

// Re-export commonly used types
pub use error::{BeQuietError, Result};
pub use host::{OutputUnit, Value};
pub use quiet::{
    advice_add, advice_remove, capture_output, funcall_quietly, is_advised, is_disabled,
    run_quietly, set_disabled, QuietScope,
};

/// Display a formatted status message through the current message primitive.
///
/// `message!(fmt, args...)` is shorthand for
/// `host::message(Some(fmt), &[Value::from(arg), ...])`.
#[macro_export]
macro_rules! message {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::host::message(
            ::std::option::Option::Some(::std::convert::AsRef::<str>::as_ref(&$fmt)),
            &[$($crate::host::Value::from($arg)),*],
        )
    };
}
