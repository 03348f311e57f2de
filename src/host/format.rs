//! Runtime values and message formatting.

use std::fmt;

use crate::error::BeQuietError;
use crate::Result;

/// A dynamically typed value passed to formatted messages and to functions
/// called through the function table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The empty value.
    #[default]
    Nil,
    /// A boolean; `true` renders as `t`, `false` as `nil`.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A single character.
    Char(char),
    /// A string.
    Str(String),
}

impl Value {
    /// Render the value in its read-back form: strings are quoted and
    /// characters use `?c` notation.
    pub fn quoted(&self) -> String {
        match self {
            Value::Str(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
                out
            }
            Value::Char(c) => format!("?{c}"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil | Value::Bool(false) => f.write_str("nil"),
            Value::Bool(true) => f.write_str("t"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

/// Format `fmt` with `args`.
///
/// Supported directives:
/// - `%s` display form
/// - `%S` quoted form
/// - `%d` integer (floats are truncated)
/// - `%f` float with six decimals
/// - `%c` character (integers are taken as code points)
/// - `%%` a literal percent sign
///
/// Surplus arguments are ignored.
pub fn format_message(fmt: &str, args: &[Value]) -> Result<String> {
    let mut out = String::with_capacity(fmt.len());
    let mut args = args.iter();
    let mut chars = fmt.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let directive = chars.next().ok_or_else(|| {
            BeQuietError::Format("format string ends in middle of format specifier".into())
        })?;
        if directive == '%' {
            out.push('%');
            continue;
        }

        let arg = args.next().ok_or_else(|| {
            BeQuietError::Format("not enough arguments for format string".into())
        })?;

        match directive {
            's' => out.push_str(&arg.to_string()),
            'S' => out.push_str(&arg.quoted()),
            'd' => match arg {
                Value::Int(n) => out.push_str(&n.to_string()),
                Value::Float(x) => out.push_str(&(x.trunc() as i64).to_string()),
                other => return Err(wrong_type('d', other)),
            },
            'f' => match arg {
                Value::Int(n) => out.push_str(&format!("{:.6}", *n as f64)),
                Value::Float(x) => out.push_str(&format!("{x:.6}")),
                other => return Err(wrong_type('f', other)),
            },
            'c' => match arg {
                Value::Char(ch) => out.push(*ch),
                Value::Int(n) => {
                    let ch = u32::try_from(*n)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| wrong_type('c', arg))?;
                    out.push(ch);
                }
                other => return Err(wrong_type('c', other)),
            },
            other => {
                return Err(BeQuietError::Format(format!(
                    "invalid format operation %{other}"
                )))
            }
        }
    }

    Ok(out)
}

fn wrong_type(directive: char, value: &Value) -> BeQuietError {
    BeQuietError::Format(format!(
        "format specifier %{directive} doesn't match argument type: {}",
        value.quoted()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(format_message("hello world", &[]).unwrap(), "hello world");
    }

    #[test]
    fn test_string_directives() {
        let args = [Value::from("abc"), Value::from("a\"b")];
        assert_eq!(
            format_message("%s and %S", &args).unwrap(),
            "abc and \"a\\\"b\""
        );
    }

    #[test]
    fn test_numeric_directives() {
        let args = [Value::from(42), Value::from(2.9), Value::from(1)];
        assert_eq!(
            format_message("%d %d %f", &args).unwrap(),
            "42 2 1.000000"
        );
    }

    #[test]
    fn test_char_directive() {
        let args = [Value::from('x'), Value::from(0x41)];
        assert_eq!(format_message("%c%c", &args).unwrap(), "xA");
    }

    #[test]
    fn test_percent_literal() {
        assert_eq!(format_message("100%%", &[]).unwrap(), "100%");
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "t");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Char('z').quoted(), "?z");
        assert_eq!(Value::from(None::<i64>), Value::Nil);
    }

    #[test]
    fn test_surplus_arguments_ignored() {
        let args = [Value::from("a"), Value::from("b")];
        assert_eq!(format_message("%s", &args).unwrap(), "a");
    }

    #[test]
    fn test_not_enough_arguments() {
        let result = format_message("%s %s", &[Value::from("only")]);
        assert!(matches!(result, Err(BeQuietError::Format(_))));
    }

    #[test]
    fn test_dangling_percent() {
        assert!(format_message("50%", &[]).is_err());
    }

    #[test]
    fn test_unknown_directive() {
        let err = format_message("%q", &[Value::Nil]).unwrap_err();
        assert!(err.to_string().contains("%q"));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(format_message("%d", &[Value::from("nope")]).is_err());
        assert!(format_message("%c", &[Value::from(-1)]).is_err());
    }
}
