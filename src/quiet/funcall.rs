//! The discarding call wrapper and its advice registration.

use tracing::debug;

use super::{is_disabled, quiet_load, quiet_write_region};
use crate::host::{self, format_message, Advice, AdviceId, Overrides, Value};
use crate::Result;

/// Identity of the advice installed by [`advice_add`].
pub const QUIET_ADVICE: AdviceId = AdviceId::new("be-quiet-funcall");

/// Call `f` with status messages and generic output discarded.
///
/// Messages are still formatted, so a bad format string fails the same way
/// it would outside, and the formatted text is still returned to the
/// caller. File writes and loads happen without notifications. With
/// interception disabled this is a plain call.
pub fn funcall_quietly<T>(f: impl FnOnce() -> T) -> T {
    if is_disabled() {
        return f();
    }

    let _guard = host::install(discard_overrides());
    f()
}

fn discard_overrides() -> Overrides {
    Overrides::new()
        .message(|format, args| format.map(|f| format_message(f, args)).transpose())
        .standard_output(|_| {})
        .write_region(quiet_write_region)
        .load(quiet_load)
        .inhibit_message(true)
}

fn quiet_around(next: &dyn Fn(&[Value]) -> Result<Value>, args: &[Value]) -> Result<Value> {
    funcall_quietly(|| next(args))
}

/// Make every later call of `name` through the function table quiet.
///
/// Returns `false` if `name` was already advised.
pub fn advice_add(name: &str) -> bool {
    let added = host::advice_add(name, Advice::around(QUIET_ADVICE, quiet_around));
    if !added {
        debug!(function = name, "already quiet");
    }
    added
}

/// Undo [`advice_add`]. Returns `false` if `name` was not advised.
pub fn advice_remove(name: &str) -> bool {
    host::advice_remove(name, QUIET_ADVICE)
}

/// Whether `name` carries the quiet advice.
pub fn is_advised(name: &str) -> bool {
    host::advice_member_p(name, QUIET_ADVICE)
}
