//! Command-line interface for be-quiet.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// File to write quietly.
    pub write: Option<PathBuf>,
    /// Text written to `write`.
    pub text: Option<String>,
    /// Module files to load quietly, in order.
    pub load: Vec<PathBuf>,
    /// Status messages to emit inside the quiet scope.
    pub messages: Vec<String>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Disable interception.
    pub loud: bool,
    /// Print the captured text to stdout afterwards.
    pub show_captured: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('w') | Long("write") => {
                result.write = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("text") => {
                result.text = Some(parser.value()?.parse()?);
            }
            Short('L') | Long("load") => {
                result.load.push(parser.value()?.parse()?);
            }
            Short('m') | Long("message") => {
                result.messages.push(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("loud") => {
                result.loud = true;
            }
            Long("show-captured") => {
                result.show_captured = true;
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if result.text.is_some() && result.write.is_none() {
        return Err(ArgsError::MissingOption("write", "text"));
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"be-quiet {version}
Run file writes, loads and messages with their status output captured

USAGE:
    be-quiet [OPTIONS]

Prints a "before" status message, performs the requested operations
inside a quiet scope, then prints an "after" status message.

OPTIONS:
    -w, --write <FILE>      Write --text to FILE without a "Wrote" message
    -t, --text <TEXT>       Text for --write [default: empty]
    -L, --load <FILE>       Load FILE without "Loading" messages (repeatable)
    -m, --message <TEXT>    Emit a status message inside the scope (repeatable)
        --show-captured     Print the captured text to stdout afterwards
        --loud              Disable interception
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    BE_QUIET_DISABLE        Disable interception (1, true, yes, on)
    BE_QUIET_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Save a file silently
    be-quiet -w notes.txt -t "hello"

    # Load two modules and show what they would have printed
    be-quiet -L a.el -L b.el --show-captured
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("be-quiet {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error("{0}")]
    Lexopt(#[from] lexopt::Error),
    /// An option was given without the option it depends on.
    #[error("--{1} requires --{0}")]
    MissingOption(&'static str, &'static str),
    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("be-quiet")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.write.is_none());
        assert!(result.load.is_empty());
        assert!(!result.loud);
        assert!(!result.show_captured);
    }

    #[test]
    fn test_write_and_text() {
        let result = parse_args_from(args(&["-w", "/tmp/out.txt", "-t", "hello"])).unwrap();
        assert_eq!(result.write, Some(PathBuf::from("/tmp/out.txt")));
        assert_eq!(result.text, Some("hello".to_string()));
    }

    #[test]
    fn test_long_options() {
        let result =
            parse_args_from(args(&["--write", "out.txt", "--text", "x", "--loud"])).unwrap();
        assert_eq!(result.write, Some(PathBuf::from("out.txt")));
        assert!(result.loud);
    }

    #[test]
    fn test_repeatable_options() {
        let result =
            parse_args_from(args(&["-L", "a.el", "-L", "b.el", "-m", "one", "-m", "two"]))
                .unwrap();
        assert_eq!(result.load, vec![PathBuf::from("a.el"), PathBuf::from("b.el")]);
        assert_eq!(result.messages, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_text_without_write() {
        let result = parse_args_from(args(&["-t", "orphan"]));
        assert!(matches!(result, Err(ArgsError::MissingOption("write", "text"))));
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_config_and_log_level() {
        let result = parse_args_from(args(&["-c", "/etc/be-quiet.json", "-l", "debug"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/be-quiet.json")));
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["stray"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }

    #[test]
    fn test_unknown_option() {
        assert!(parse_args_from(args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_missing_value() {
        assert!(parse_args_from(args(&["-w"])).is_err());
    }
}
