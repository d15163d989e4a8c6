use std::fmt::{self, Display, Formatter, Write};

use itertools::Itertools;

/// A Python value that can be written as a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PyLiteral {
    Str(String),
    Bytes(Vec<u8>),
    Int(i128),
    Float(f64),
    Bool(bool),
    None,
    Tuple(Vec<PyLiteral>),
    List(Vec<PyLiteral>),
    Set(Vec<PyLiteral>),
    Dict(Vec<(PyLiteral, PyLiteral)>),
}

impl PyLiteral {
    /// The name of the Python type of the value, e.g. `str` or `tuple`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::None => "NoneType",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The items of a tuple, list or set.
    pub fn as_sequence(&self) -> Option<&[PyLiteral]> {
        match self {
            Self::Tuple(items) | Self::List(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value may be used as a dict key or set member.
    pub fn is_hashable(&self) -> bool {
        match self {
            Self::List(_) | Self::Set(_) | Self::Dict(_) => false,
            Self::Tuple(items) => items.iter().all(Self::is_hashable),
            _ => true,
        }
    }

    /// The value as Python's `repr()` would render it.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        match self {
            Self::Str(value) => write_str_repr(value, out),
            Self::Bytes(value) => write_bytes_repr(value, out),
            Self::Int(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Float(value) => out.push_str(&float_repr(*value)),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::None => out.push_str("None"),
            Self::Tuple(items) => {
                out.push('(');
                write_items(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::List(items) => {
                out.push('[');
                write_items(items, out);
                out.push(']');
            }
            Self::Set(items) if items.is_empty() => out.push_str("set()"),
            Self::Set(items) => {
                out.push('{');
                write_items(items, out);
                out.push('}');
            }
            Self::Dict(items) => {
                out.push('{');
                for (index, (key, value)) in items.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out);
                    out.push_str(": ");
                    value.write_repr(out);
                }
                out.push('}');
            }
        }
    }
}

/// Renders the value the way Python's `str()` would: strings as their contents, everything else
/// as its `repr()`.
impl Display for PyLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            other => f.write_str(&other.repr()),
        }
    }
}

fn write_items(items: &[PyLiteral], out: &mut String) {
    out.push_str(&items.iter().map(PyLiteral::repr).join(", "));
}

fn write_str_repr(value: &str, out: &mut String) {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c < ' ' || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn write_bytes_repr(value: &[u8], out: &mut String) {
    let quote = if value.contains(&b'\'') && !value.contains(&b'"') {
        '"'
    } else {
        '\''
    };
    out.push('b');
    out.push(quote);
    for &byte in value {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            byte if char::from(byte) == quote => {
                out.push('\\');
                out.push(quote);
            }
            b' '..=b'~' => out.push(char::from(byte)),
            byte => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push(quote);
}

/// Python's float `repr()`: the shortest round-tripping digits, always with a decimal point or
/// exponent, and scientific notation outside of `1e-4 <= |x| < 1e16`.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // Rust's `{:e}` formatting also uses the shortest round-tripping digits, e.g. `1.5e-7`.
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_scalars() {
        assert_eq!(PyLiteral::Str("it's".to_string()).repr(), r#""it's""#);
        assert_eq!(PyLiteral::Str("a\nb".to_string()).repr(), r"'a\nb'");
        assert_eq!(PyLiteral::Str("q'\"".to_string()).repr(), r#"'q\'"'"#);
        assert_eq!(PyLiteral::Bytes(b"a\xff".to_vec()).repr(), r"b'a\xff'");
        assert_eq!(PyLiteral::Int(-42).repr(), "-42");
        assert_eq!(PyLiteral::Bool(true).repr(), "True");
        assert_eq!(PyLiteral::None.repr(), "None");
    }

    #[test]
    fn repr_floats() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-2.5), "-2.5");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(123_456.789), "123456.789");
    }

    #[test]
    fn repr_containers() {
        let one = PyLiteral::Int(1);
        let text = PyLiteral::Str("a".to_string());
        assert_eq!(PyLiteral::Tuple(vec![one.clone()]).repr(), "(1,)");
        assert_eq!(PyLiteral::Tuple(vec![]).repr(), "()");
        assert_eq!(
            PyLiteral::List(vec![one.clone(), text.clone()]).repr(),
            "[1, 'a']"
        );
        assert_eq!(PyLiteral::Set(vec![]).repr(), "set()");
        assert_eq!(
            PyLiteral::Dict(vec![(text, PyLiteral::Tuple(vec![one.clone(), one]))]).repr(),
            "{'a': (1, 1)}"
        );
    }

    #[test]
    fn display_uses_str() {
        assert_eq!(PyLiteral::Str("1.0".to_string()).to_string(), "1.0");
        assert_eq!(
            PyLiteral::List(vec![PyLiteral::Str("x".to_string())]).to_string(),
            "['x']"
        );
    }

    #[test]
    fn hashable() {
        assert!(PyLiteral::Tuple(vec![PyLiteral::Int(1)]).is_hashable());
        assert!(!PyLiteral::Tuple(vec![PyLiteral::List(vec![])]).is_hashable());
        assert!(!PyLiteral::Dict(vec![]).is_hashable());
    }
}
