//! The capturing quiet scope.

use tracing::{debug, trace};

use super::{is_disabled, quiet_load, quiet_write_region};
use crate::host::{self, format_message, BufferId, Overrides, HOST};

/// Base name of capture sink buffers. The leading space keeps them hidden.
pub const SINK_BUFFER_NAME: &str = " *be-quiet*";

/// Handle to the running quiet scope, passed to the body.
///
/// Dropping the scope kills the sink if it is still live.
#[derive(Debug)]
pub struct QuietScope {
    sink: BufferId,
    intercepting: bool,
}

impl QuietScope {
    fn open(intercepting: bool) -> Self {
        let sink = host::generate_new_buffer(SINK_BUFFER_NAME);
        debug!(%sink, intercepting, "quiet scope opened");
        Self { sink, intercepting }
    }

    /// The capture sink buffer.
    pub fn sink(&self) -> BufferId {
        self.sink
    }

    /// Text captured so far, or an empty string once the sink is gone.
    pub fn output(&self) -> String {
        host::buffer_string(self.sink).unwrap_or_default()
    }

    /// Whether the sink buffer is still live.
    pub fn is_live(&self) -> bool {
        host::buffer_live_p(self.sink)
    }

    /// Kill the sink early. Later output in this scope is dropped.
    pub fn kill_sink(&self) -> bool {
        host::kill_buffer(self.sink)
    }

    /// Whether output is being intercepted, as decided when the scope opened.
    pub fn is_intercepting(&self) -> bool {
        self.intercepting
    }
}

impl Drop for QuietScope {
    fn drop(&mut self) {
        let killed = HOST
            .try_with(|h| h.buffers.kill(self.sink))
            .unwrap_or(false);
        debug!(sink = %self.sink, killed, "quiet scope closed");
    }
}

/// Run `body` with status messages and generic output captured into a
/// fresh hidden sink.
///
/// While the body runs:
/// - `message` appends the formatted text plus a newline to the sink and
///   returns the text; a `None` format appends nothing
/// - generic output units are appended to the sink verbatim
/// - file writes happen without a `Wrote` message
/// - loads happen without `Loading` messages
/// - status display is inhibited
///
/// All of that is undone before this function returns, whether the body
/// returns or panics, and the sink is killed afterwards. If interception is
/// disabled when the scope starts, the body runs with nothing replaced and
/// the sink stays empty.
pub fn run_quietly<T>(body: impl FnOnce(&QuietScope) -> T) -> T {
    let intercepting = !is_disabled();
    let scope = QuietScope::open(intercepting);
    if !intercepting {
        return body(&scope);
    }

    // Declared after `scope`, so the primitives are restored before the
    // sink is killed.
    let _guard = host::install(sink_overrides(scope.sink));
    body(&scope)
}

/// Run `body` quietly and return its value together with the captured text.
pub fn capture_output<T>(body: impl FnOnce() -> T) -> (T, String) {
    run_quietly(|scope| {
        let value = body();
        (value, scope.output())
    })
}

fn sink_overrides(sink: BufferId) -> Overrides {
    Overrides::new()
        .message(move |format, args| {
            let Some(format) = format else {
                return Ok(None);
            };
            let text = format_message(format, args)?;
            trace!(%sink, "message captured");
            host::buffer_append(sink, &format!("{text}\n"));
            Ok(Some(text))
        })
        .standard_output(move |unit| {
            let mut buf = [0u8; 4];
            host::buffer_append(sink, unit.as_str(&mut buf));
        })
        .write_region(quiet_write_region)
        .load(quiet_load)
        .inhibit_message(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{messages_log, princ, write_char, Value};
    use crate::quiet::set_disabled;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_message_is_captured() {
        let output = run_quietly(|scope| {
            host::message(Some("captured %s"), &[Value::from("text")]).unwrap();
            scope.output()
        });
        assert_eq!(output, "captured text\n");
        assert!(!messages_log().contains("captured text"));
    }

    #[test]
    #[serial]
    fn test_message_value_propagates() {
        let result = run_quietly(|_| host::message(Some("hi"), &[]));
        assert_eq!(result.unwrap().as_deref(), Some("hi"));
    }

    #[test]
    #[serial]
    fn test_null_format_captures_nothing() {
        let output = run_quietly(|scope| {
            assert_eq!(host::message(None, &[]).unwrap(), None);
            scope.output()
        });
        assert_eq!(output, "");
    }

    #[test]
    #[serial]
    fn test_generic_output_in_order() {
        let output = run_quietly(|scope| {
            write_char('a');
            princ("bc");
            write_char('d');
            scope.output()
        });
        assert_eq!(output, "abcd");
    }

    #[test]
    #[serial]
    fn test_sink_is_hidden_and_killed() {
        let before = host::buffer_list();
        let sink = run_quietly(|scope| {
            assert!(scope.is_live());
            assert_eq!(host::buffer_name(scope.sink()).unwrap(), SINK_BUFFER_NAME);
            assert_eq!(host::buffer_list(), before);
            scope.sink()
        });
        assert!(!host::buffer_live_p(sink));
    }

    #[test]
    #[serial]
    fn test_killed_sink_reads_empty() {
        let output = run_quietly(|scope| {
            host::message(Some("lost"), &[]).unwrap();
            assert!(scope.kill_sink());
            host::message(Some("also lost"), &[]).unwrap();
            princ("gone");
            scope.output()
        });
        assert_eq!(output, "");
        assert!(!messages_log().contains("also lost"));
    }

    #[test]
    #[serial]
    fn test_nested_scopes_have_own_sinks() {
        let (outer, inner) = run_quietly(|outer| {
            host::message(Some("outer-1"), &[]).unwrap();
            let inner = run_quietly(|inner| {
                host::message(Some("inner"), &[]).unwrap();
                inner.output()
            });
            host::message(Some("outer-2"), &[]).unwrap();
            (outer.output(), inner)
        });
        assert_eq!(inner, "inner\n");
        assert_eq!(outer, "outer-1\nouter-2\n");
    }

    #[test]
    #[serial]
    fn test_inhibit_flag_scoped() {
        assert!(!host::inhibit_message());
        run_quietly(|_| assert!(host::inhibit_message()));
        assert!(!host::inhibit_message());
    }

    #[test]
    #[serial]
    fn test_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            run_quietly(|_| panic!("body failed"));
        });
        assert!(result.is_err());
        assert!(!host::inhibit_message());

        host::message(Some("after panic"), &[]).unwrap();
        assert!(messages_log().contains("after panic"));
    }

    #[test]
    #[serial]
    fn test_disabled_passes_through() {
        set_disabled(true);
        let output = run_quietly(|scope| {
            assert!(!scope.is_intercepting());
            host::message(Some("loud message"), &[]).unwrap();
            scope.output()
        });
        set_disabled(false);

        assert_eq!(output, "");
        assert!(messages_log().contains("loud message"));
    }

    #[test]
    #[serial]
    fn test_disable_latched_at_entry() {
        let output = run_quietly(|scope| {
            set_disabled(true);
            host::message(Some("still captured"), &[]).unwrap();
            set_disabled(false);
            scope.output()
        });
        assert_eq!(output, "still captured\n");
    }

    #[test]
    #[serial]
    fn test_capture_output() {
        let (value, text) = capture_output(|| {
            princ("x");
            7
        });
        assert_eq!(value, 7);
        assert_eq!(text, "x");
    }
}
