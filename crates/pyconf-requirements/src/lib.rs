//! Parses the requirement files that `dependencies` and `optional-dependencies` point to through
//! the `file` directive.
//!
//! The format is a strict subset of `requirements.txt`: one [PEP 508] requirement per line,
//! with comments, blank lines and escaped newlines.
//!
//! ```text
//! # comment
//! attrs>=23 # trailing comment
//! requests[socks] \
//!     ; python_version >= "3.8"
//! ```
//!
//! Unlike pip, options such as `-r other.txt`, `-e .` or `--index-url` are not supported, since
//! a package's metadata can't reference other files or indexes.
//!
//! [PEP 508]: https://peps.python.org/pep-0508/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pep508_rs::{Pep508Error, Requirement};
use thiserror::Error;
use tracing::trace;
use unscanny::Scanner;

/// A requirement with the line it was declared on.
#[derive(Debug, Clone)]
pub struct RequirementEntry {
    pub requirement: Requirement,
    /// The 1-based line the requirement starts on.
    pub line: usize,
}

impl Display for RequirementEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.requirement)
    }
}

/// The parsed contents of a requirement file.
#[derive(Debug, Clone, Default)]
pub struct RequirementsFile {
    pub requirements: Vec<RequirementEntry>,
}

impl RequirementsFile {
    /// Parse the contents of a requirement file.
    pub fn parse(content: &str) -> Result<Self, RequirementsError> {
        let mut s = Scanner::new(content);
        let mut requirements = Vec::new();
        while let Some(entry) = parse_entry(&mut s, content)? {
            requirements.push(entry);
        }
        trace!("Parsed {} requirements", requirements.len());
        Ok(Self { requirements })
    }

    /// The requirements, formatted in their normalized form.
    pub fn to_strings(&self) -> Vec<String> {
        self.requirements
            .iter()
            .map(|entry| entry.requirement.to_string())
            .collect()
    }
}

/// Parse a single requirement, consuming all preceding whitespace and comments.
///
/// Returns `None` at the end of the file.
fn parse_entry(
    s: &mut Scanner,
    content: &str,
) -> Result<Option<RequirementEntry>, RequirementsError> {
    eat_wrappable_whitespace(s);
    while s.at(['\n', '\r', '#']) {
        eat_trailing_line(s, content)?;
        eat_wrappable_whitespace(s);
    }

    let start = s.cursor();
    let Some(c) = s.peek() else {
        return Ok(None);
    };

    if c == '-' {
        let option = s.eat_while(|c: char| !c.is_whitespace() && c != '=');
        let (line, column) = position(content, start);
        return Err(RequirementsError::UnsupportedOption {
            option: option.to_string(),
            line,
            column,
        });
    }
    if !c.is_ascii_alphanumeric() {
        let (line, column) = position(content, start);
        return Err(RequirementsError::Unexpected {
            found: c,
            line,
            column,
        });
    }

    // Termination: `s.eat()` eventually becomes `None`.
    let end = loop {
        let end = s.cursor();

        // We look for the end of the line ...
        if s.eat_if('\n') {
            break end;
        }
        if s.eat_if('\r') {
            s.eat_if('\n');
            break end;
        }
        // ... or a comment separated by whitespace ...
        if !eat_wrappable_whitespace(s).is_empty() {
            if s.eat_if('#') {
                s.eat_until(['\r', '\n']);
                break end;
            }
            continue;
        }
        // ... or the end of the file, which works like the end of line.
        if s.eat().is_none() {
            break end;
        }
    };

    let text = join_continuations(&content[start..end]);
    let (line, _) = position(content, start);
    let requirement =
        Requirement::from_str(&text).map_err(|err| RequirementsError::Pep508 {
            requirement: text.trim().to_string(),
            line,
            source: Box::new(err),
        })?;
    Ok(Some(RequirementEntry { requirement, line }))
}

/// Eat whitespace and ignore newlines escaped with a backslash.
fn eat_wrappable_whitespace<'a>(s: &mut Scanner<'a>) -> &'a str {
    let start = s.cursor();
    s.eat_while([' ', '\t']);
    // With this order we support `\n`, `\r` and `\r\n` without accidentally eating a `\n\r`.
    while s.eat_if("\\\n") || s.eat_if("\\\r\n") || s.eat_if("\\\r") {
        s.eat_while([' ', '\t']);
    }
    s.from(start)
}

/// Eat the end of the line, including a comment.
fn eat_trailing_line(s: &mut Scanner, content: &str) -> Result<(), RequirementsError> {
    s.eat_while([' ', '\t']);
    let start = s.cursor();
    match s.eat() {
        None | Some('\n') => {}
        Some('\r') => {
            s.eat_if('\n');
        }
        Some('#') => {
            s.eat_until(['\r', '\n']);
            s.eat_if('\r');
            s.eat_if('\n');
        }
        Some(other) => {
            let (line, column) = position(content, start);
            return Err(RequirementsError::Unexpected {
                found: other,
                line,
                column,
            });
        }
    }
    Ok(())
}

/// Replace escaped newlines inside a requirement with spaces.
fn join_continuations(text: &str) -> String {
    text.replace("\\\r\n", " ")
        .replace("\\\n", " ")
        .replace("\\\r", " ")
}

/// The 1-based line and column of a byte offset.
fn position(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset];
    let line = before.chars().filter(|c| *c == '\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[derive(Debug, Error)]
pub enum RequirementsError {
    #[error(
        "Unsupported option `{option}` at line {line}, column {column}: only requirements are allowed"
    )]
    UnsupportedOption {
        option: String,
        line: usize,
        column: usize,
    },
    #[error("Expected a requirement, found `{found}` at line {line}, column {column}")]
    Unexpected {
        found: char,
        line: usize,
        column: usize,
    },
    #[error("Invalid requirement `{requirement}` at line {line}")]
    Pep508 {
        requirement: String,
        line: usize,
        #[source]
        source: Box<Pep508Error>,
    },
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn parse() {
        let content = indoc! {r#"
            # A comment

            attrs>=23.1  # trailing
            requests[socks] \
                >=2.31
            packaging
        "#};
        let file = RequirementsFile::parse(content).unwrap();
        let lines: Vec<_> = file.requirements.iter().map(|entry| entry.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
        assert_eq!(
            file.to_strings(),
            vec![
                "attrs>=23.1",
                "requests[socks]>=2.31",
                "packaging",
            ]
        );
    }

    #[test]
    fn empty() {
        let file = RequirementsFile::parse("# nothing\n\n   \n").unwrap();
        assert!(file.requirements.is_empty());
        assert!(RequirementsFile::parse("").unwrap().requirements.is_empty());
    }

    #[test]
    fn crlf() {
        let file = RequirementsFile::parse("attrs\r\n# comment\r\npackaging\r\n").unwrap();
        assert_eq!(file.to_strings(), vec!["attrs", "packaging"]);
        assert_eq!(file.requirements[1].line, 3);
    }

    #[test]
    fn options_are_rejected() {
        let err = RequirementsFile::parse("attrs\n  -r other.txt\n").unwrap_err();
        assert_snapshot!(err, @"Unsupported option `-r` at line 2, column 3: only requirements are allowed");

        let err = RequirementsFile::parse("--index-url=https://example.com\n").unwrap_err();
        assert_snapshot!(err, @"Unsupported option `--index-url` at line 1, column 1: only requirements are allowed");
    }

    #[test]
    fn unexpected_character() {
        let err = RequirementsFile::parse("attrs\n./local\n").unwrap_err();
        assert_snapshot!(err, @"Expected a requirement, found `.` at line 2, column 1");
    }

    #[test]
    fn invalid_requirement() {
        let err = RequirementsFile::parse("attrs\nnumpy>=>1\n").unwrap_err();
        assert_snapshot!(err, @"Invalid requirement `numpy>=>1` at line 2");
        assert!(std::error::Error::source(&err).is_some());
    }
}
