//! Quiet scopes and the quiet call wrapper.
//!
//! [`run_quietly`] captures status messages and generic output into a
//! hidden sink buffer for the duration of a body. [`funcall_quietly`]
//! discards them instead, and [`advice_add`] applies it to every call of a
//! named function. In both, file writes and module loads still happen but
//! report nothing.
//!
//! # Example
//!
//! ```
//! use be_quiet::{message, run_quietly};
//!
//! let captured = run_quietly(|scope| {
//!     message!("hidden %d", 1).unwrap();
//!     be_quiet::host::princ("also hidden");
//!     scope.output()
//! });
//! assert_eq!(captured, "hidden 1\nalso hidden");
//! ```

mod funcall;
mod scope;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::host::{self, LoadOptions, WriteNotify, WriteRequest};
use crate::Result;

pub use funcall::{advice_add, advice_remove, funcall_quietly, is_advised, QUIET_ADVICE};
pub use scope::{capture_output, run_quietly, QuietScope, SINK_BUFFER_NAME};

/// Process-wide switch that turns quiet scopes into plain pass-through.
static DISABLED: AtomicBool = AtomicBool::new(false);

/// Enable or disable interception for scopes entered from now on.
///
/// Scopes that are already running keep the behavior they started with.
pub fn set_disabled(disabled: bool) {
    DISABLED.store(disabled, Ordering::SeqCst);
}

/// Whether newly entered scopes will pass output through untouched.
pub fn is_disabled() -> bool {
    DISABLED.load(Ordering::SeqCst)
}

/// Write through the pristine file-write primitive without notification.
fn quiet_write_region(request: &WriteRequest) -> Result<()> {
    let request = request.clone().with_notify(WriteNotify::Silent);
    host::original_write_region(&request)
}

/// Load through the pristine load primitive without `Loading` messages.
fn quiet_load(path: &Path, options: LoadOptions) -> Result<bool> {
    host::original_load(
        path,
        LoadOptions {
            nomessage: true,
            ..options
        },
    )
}
