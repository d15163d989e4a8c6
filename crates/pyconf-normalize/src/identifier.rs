use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Simplified Python identifier.
///
/// We don't match Python's identifier rules
/// (<https://docs.python.org/3.13/reference/lexical_analysis.html#identifiers>) exactly
/// (we just use Rust's `is_alphabetic`) and we don't convert to NFKC, but it's good enough
/// for our validation purposes.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Identifier(Box<str>);

#[derive(Debug, Clone, Error)]
pub enum IdentifierParseError {
    #[error("An identifier must not be empty")]
    Empty,
    #[error(
        "Invalid first character `{first}` for identifier `{identifier}`, expected an underscore or an alphabetic character"
    )]
    InvalidFirstChar { first: char, identifier: Box<str> },
    #[error(
        "Invalid character `{invalid_char}` at position {pos} for identifier `{identifier}`, \
        expected an underscore or an alphanumeric character"
    )]
    InvalidChar {
        pos: usize,
        invalid_char: char,
        identifier: Box<str>,
    },
}

impl Identifier {
    pub fn new(identifier: impl Into<Box<str>>) -> Result<Self, IdentifierParseError> {
        let identifier = identifier.into();
        let mut chars = identifier.chars().enumerate();
        let (_, first_char) = chars.next().ok_or(IdentifierParseError::Empty)?;
        if first_char != '_' && !first_char.is_alphabetic() {
            return Err(IdentifierParseError::InvalidFirstChar {
                first: first_char,
                identifier,
            });
        }

        for (pos, current_char) in chars {
            if current_char != '_' && !current_char.is_alphanumeric() {
                return Err(IdentifierParseError::InvalidChar {
                    // Make the position 1-indexed
                    pos: pos + 1,
                    invalid_char: current_char,
                    identifier,
                });
            }
        }

        Ok(Self(identifier))
    }

    /// Returns `true` if the string is a valid identifier.
    pub fn is_valid(identifier: &str) -> bool {
        Self::from_str(identifier).is_ok()
    }
}

impl FromStr for Identifier {
    type Err = IdentifierParseError;

    fn from_str(identifier: &str) -> Result<Self, Self::Err> {
        Self::new(identifier.to_string())
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Identifier::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A dot-separated path of identifiers, such as a package (`foo.bar`) or a qualified object
/// name (`foo.cli.Command`).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DottedName(String);

impl DottedName {
    /// The identifiers making up the name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The number of identifiers in the name.
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Always `false`: a dotted name has at least one segment.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DottedName {
    type Err = IdentifierParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        for segment in name.split('.') {
            Identifier::from_str(segment)?;
        }
        Ok(Self(name.to_string()))
    }
}

impl Display for DottedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DottedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for DottedName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DottedName::from_str(&s)
            .map_err(|err| serde::de::Error::custom(format!("Invalid name `{s}`: {err}")))
    }
}

impl Serialize for DottedName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn attribute_names() {
        for name in ["__version__", "VERSION", "_", "version_info2", "versión"] {
            assert!(Identifier::is_valid(name), "{name}");
        }
        for name in ["", "2to3", "my-version", "version.info"] {
            assert!(!Identifier::is_valid(name), "{name}");
        }
    }

    #[test]
    fn dotted_names() {
        let name = DottedName::from_str("hello.cli.Command").unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.as_str(), "hello.cli.Command");
        assert_eq!(DottedName::from_str("hello").unwrap().len(), 1);

        assert_snapshot!(
            DottedName::from_str("hello..cli").unwrap_err(),
            @"An identifier must not be empty"
        );
        assert_snapshot!(
            DottedName::from_str("hello.2cli").unwrap_err(),
            @"Invalid first character `2` for identifier `2cli`, expected an underscore or an alphabetic character"
        );
        assert_snapshot!(
            DottedName::from_str("hello.my-cli").unwrap_err(),
            @"Invalid character `-` at position 3 for identifier `my-cli`, expected an underscore or an alphanumeric character"
        );
    }
}
