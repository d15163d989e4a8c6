use thiserror::Error;

/// An error while reading a Python module, with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct Error {
    pub line: usize,
    pub kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(line: usize, kind: ErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unexpected character `{0}`")]
    UnexpectedCharacter(char),
    #[error("Unmatched closing bracket `{0}`")]
    UnmatchedBracket(char),
    #[error("Bracket `{0}` was never closed")]
    UnclosedBracket(char),
    #[error("Invalid number literal `{0}`")]
    InvalidNumber(String),
    #[error("Integer literal `{0}` is too large")]
    IntegerOverflow(String),
    #[error("Invalid escape sequence `{0}`")]
    InvalidEscape(String),
    #[error("Bytes literals can only contain ASCII characters")]
    NonAsciiBytes,
    #[error("Cannot mix bytes and string literals")]
    MixedBytesAndStr,
    #[error("Expected a literal value, found {0}")]
    NotALiteral(String),
    #[error("Named Unicode escape `{0}` is not supported")]
    NamedEscape(String),
    #[error("Expression is nested more than {0} levels deep")]
    TooDeeplyNested(usize),
}
