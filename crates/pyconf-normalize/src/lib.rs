//! Names as they appear in Python packaging metadata.
//!
//! Package and extra names are compared in their normalized form: lowercase, with every run of
//! `-`, `_` and `.` collapsed into a single `-`
//! (<https://packaging.python.org/en/latest/specifications/name-normalization/>).

use std::borrow::Cow;

use thiserror::Error;

pub use extra_name::ExtraName;
pub use identifier::{DottedName, Identifier, IdentifierParseError};
pub use package_name::PackageName;

mod extra_name;
mod identifier;
mod package_name;

/// A package or extra name that doesn't match `^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$`.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
#[error(
    "`{0}` is not a valid name: names must start and end with an ASCII letter or digit, \
    and may only contain ASCII letters, digits, `-`, `_` and `.`"
)]
pub struct InvalidNameError(String);

impl InvalidNameError {
    /// The name as it was given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_separator(byte: u8) -> bool {
    matches!(byte, b'-' | b'_' | b'.')
}

fn is_valid(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|&byte| byte.is_ascii_alphanumeric() || is_separator(byte))
        }
        _ => false,
    }
}

/// Whether a valid name is already in its normal form.
fn is_normal_form(name: &str) -> bool {
    !name.contains("--")
        && !name
            .bytes()
            .any(|byte| byte.is_ascii_uppercase() || matches!(byte, b'_' | b'.'))
}

/// Validate a package or extra name and bring it into its normal form.
///
/// Borrows the input when it is already normalized.
pub(crate) fn normalize(name: &str) -> Result<Cow<'_, str>, InvalidNameError> {
    if !is_valid(name) {
        return Err(InvalidNameError(name.to_string()));
    }
    if is_normal_form(name) {
        return Ok(Cow::Borrowed(name));
    }

    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;
    for byte in name.bytes() {
        if is_separator(byte) {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            normalized.push('-');
            pending_separator = false;
        }
        normalized.push(char::from(byte.to_ascii_lowercase()));
    }
    Ok(Cow::Owned(normalized))
}

#[cfg(test)]
mod tests;
