//! A tokenizer for the subset of Python's lexical structure needed to find module-level
//! statements.
//!
//! The source is split into logical lines: physical lines joined by open brackets or backslash
//! continuations, with comments and blank lines removed. Each logical line records the width of
//! its indentation, so that module-level statements (indentation `0`) can be told apart from
//! statement bodies.

use unscanny::Scanner;

use crate::error::{Error, ErrorKind};

/// Longest operators first, so that `**=` is not split into `**` and `=`.
const OPERATORS: [&str; 47] = [
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "@=", "**", "//", "<<", ">>", "+", "-", "*", "/", "%", "@", "&", "|",
    "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ";", ".", "=",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// An identifier or keyword.
    Name(String),
    /// The unparsed text of a number, e.g. `0x_ff` or `1.5e-3`.
    Number(String),
    String(StrToken),
    Op(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StrToken {
    pub(crate) value: StrValue,
    /// f-strings (and t-strings) have a value only at runtime.
    pub(crate) formatted: bool,
    /// The first `\N{...}` escape, whose character would need the Unicode name database.
    pub(crate) named_escape: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StrValue {
    Str(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    /// The 1-based line on which the token starts.
    pub(crate) line: usize,
}

impl Token {
    pub(crate) fn is_op(&self, op: &str) -> bool {
        matches!(self.kind, TokenKind::Op(current) if current == op)
    }

    pub(crate) fn is_name(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(current) if current == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogicalLine {
    /// The 1-based line on which the logical line starts.
    pub(crate) line: usize,
    /// The number of whitespace characters before the first token.
    pub(crate) indent: usize,
    pub(crate) tokens: Vec<Token>,
}

struct Lexer<'a> {
    s: Scanner<'a>,
    line: usize,
    /// Open brackets with the line they were opened on.
    brackets: Vec<(char, usize)>,
}

/// Split Python source into logical lines of tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<LogicalLine>, Error> {
    let mut lexer = Lexer {
        s: Scanner::new(source),
        line: 1,
        brackets: Vec::new(),
    };
    lexer.s.eat_if('\u{feff}');

    let mut lines = Vec::new();
    let mut current: Option<LogicalLine> = None;
    loop {
        if current.is_none() {
            // We're at the start of a physical line that isn't a continuation.
            let indent = lexer.s.eat_while([' ', '\t', '\x0c']).chars().count();
            if lexer.s.eat_if('#') {
                lexer.s.eat_until(['\r', '\n']);
            }
            if lexer.eat_newline() {
                continue;
            }
            if lexer.s.done() {
                break;
            }
            current = Some(LogicalLine {
                line: lexer.line,
                indent,
                tokens: Vec::new(),
            });
        }

        let Some(c) = lexer.s.peek() else {
            break;
        };
        let line = lexer.line;
        let kind = match c {
            ' ' | '\t' | '\x0c' => {
                lexer.s.eat();
                continue;
            }
            '#' => {
                lexer.s.eat_until(['\r', '\n']);
                continue;
            }
            '\r' | '\n' => {
                lexer.eat_newline();
                if lexer.brackets.is_empty() {
                    if let Some(logical) = current.take() {
                        if !logical.tokens.is_empty() {
                            lines.push(logical);
                        }
                    }
                }
                continue;
            }
            '\\' => {
                lexer.s.eat();
                if lexer.eat_newline() || lexer.s.done() {
                    continue;
                }
                return Err(Error::new(line, ErrorKind::UnexpectedCharacter('\\')));
            }
            '\'' | '"' => lexer.string("")?,
            '0'..='9' => lexer.number(),
            '.' if lexer.s.scout(1).is_some_and(|c| c.is_ascii_digit()) => lexer.number(),
            c if is_identifier_start(c) => {
                let name = lexer.s.eat_while(is_identifier_continue);
                if lexer.s.at(['\'', '"']) && is_string_prefix(name) {
                    lexer.string(name)?
                } else {
                    TokenKind::Name(name.to_string())
                }
            }
            c => lexer.operator(c)?,
        };

        if let Some(logical) = current.as_mut() {
            logical.tokens.push(Token { kind, line });
        }
    }

    if let Some(&(bracket, line)) = lexer.brackets.last() {
        return Err(Error::new(line, ErrorKind::UnclosedBracket(bracket)));
    }
    if let Some(logical) = current.take() {
        if !logical.tokens.is_empty() {
            lines.push(logical);
        }
    }
    Ok(lines)
}

impl Lexer<'_> {
    /// Eat a `\n`, `\r\n` or a stray `\r`.
    fn eat_newline(&mut self) -> bool {
        if self.s.eat_if('\n') {
            self.line += 1;
            true
        } else if self.s.eat_if('\r') {
            self.s.eat_if('\n');
            self.line += 1;
            true
        } else {
            false
        }
    }

    fn operator(&mut self, c: char) -> Result<TokenKind, Error> {
        let Some(op) = OPERATORS.iter().copied().find(|op| self.s.eat_if(*op)) else {
            return Err(Error::new(self.line, ErrorKind::UnexpectedCharacter(c)));
        };
        match op {
            "(" | "[" | "{" => self.brackets.push((c, self.line)),
            ")" | "]" | "}" => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => return Err(Error::new(self.line, ErrorKind::UnmatchedBracket(c))),
                }
            }
            _ => {}
        }
        Ok(TokenKind::Op(op))
    }

    fn number(&mut self) -> TokenKind {
        let start = self.s.cursor();
        if self.s.at('0') && matches!(self.s.scout(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.s.eat();
            self.s.eat();
            self.s.eat_while(|c: char| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.s.eat_while(|c: char| c.is_ascii_digit() || c == '_');
            if self.s.eat_if('.') {
                self.s.eat_while(|c: char| c.is_ascii_digit() || c == '_');
            }
            if self.s.at(['e', 'E']) {
                let before_exponent = self.s.cursor();
                self.s.eat();
                self.s.eat_if(['+', '-']);
                if self
                    .s
                    .eat_while(|c: char| c.is_ascii_digit() || c == '_')
                    .is_empty()
                {
                    self.s.jump(before_exponent);
                }
            }
            self.s.eat_if(['j', 'J']);
        }
        TokenKind::Number(self.s.from(start).to_string())
    }

    /// Lex a string literal, with the cursor on the opening quote.
    fn string(&mut self, prefix: &str) -> Result<TokenKind, Error> {
        let start_line = self.line;
        let prefix = prefix.to_ascii_lowercase();
        let raw = prefix.contains('r');
        let formatted = prefix.contains('f') || prefix.contains('t');
        let mut buffer = if prefix.contains('b') {
            Buffer::Bytes(Vec::new())
        } else {
            Buffer::Str(String::new())
        };

        let Some(quote) = self.s.eat() else {
            return Err(Error::new(start_line, ErrorKind::UnterminatedString));
        };
        let pair = if quote == '"' { "\"\"" } else { "''" };
        let triple = self.s.eat_if(pair);
        let mut named_escape = None;

        loop {
            let Some(c) = self.s.eat() else {
                return Err(Error::new(start_line, ErrorKind::UnterminatedString));
            };
            match c {
                c if c == quote => {
                    if !triple || self.s.eat_if(pair) {
                        break;
                    }
                    buffer.push_char(c, self.line)?;
                }
                '\r' | '\n' => {
                    if !triple {
                        return Err(Error::new(start_line, ErrorKind::UnterminatedString));
                    }
                    if c == '\r' {
                        self.s.eat_if('\n');
                    }
                    self.line += 1;
                    buffer.push_char('\n', self.line)?;
                }
                '\\' if raw => {
                    // In raw strings, a backslash still prevents the next character from
                    // terminating the string, but both characters are kept.
                    buffer.push_char('\\', self.line)?;
                    match self.s.eat() {
                        None => {
                            return Err(Error::new(start_line, ErrorKind::UnterminatedString));
                        }
                        Some('\r' | '\n') => {
                            self.s.uneat();
                            self.eat_newline();
                            buffer.push_char('\n', self.line)?;
                        }
                        Some(next) => buffer.push_char(next, self.line)?,
                    }
                }
                '\\' => {
                    if let Some(escape) = self.escape(&mut buffer, start_line)? {
                        named_escape.get_or_insert(escape);
                    }
                }
                c => buffer.push_char(c, self.line)?,
            }
        }

        let value = match buffer {
            Buffer::Str(value) => StrValue::Str(value),
            Buffer::Bytes(value) => StrValue::Bytes(value),
        };
        Ok(TokenKind::String(StrToken {
            value,
            formatted,
            named_escape,
        }))
    }

    /// Decode an escape sequence, with the cursor after the backslash.
    ///
    /// A `\N{...}` escape is skipped and returned instead of decoded.
    fn escape(&mut self, buffer: &mut Buffer, start_line: usize) -> Result<Option<String>, Error> {
        let line = self.line;
        let Some(c) = self.s.eat() else {
            return Err(Error::new(start_line, ErrorKind::UnterminatedString));
        };
        match c {
            // A line continuation inside the string.
            '\n' => self.line += 1,
            '\r' => {
                self.s.eat_if('\n');
                self.line += 1;
            }
            '\\' | '\'' | '"' => buffer.push_char(c, line)?,
            'a' => buffer.push_char('\x07', line)?,
            'b' => buffer.push_char('\x08', line)?,
            'f' => buffer.push_char('\x0c', line)?,
            'n' => buffer.push_char('\n', line)?,
            'r' => buffer.push_char('\r', line)?,
            't' => buffer.push_char('\t', line)?,
            'v' => buffer.push_char('\x0b', line)?,
            '0'..='7' => {
                let start = self.s.cursor() - 1;
                for _ in 0..2 {
                    if !self.s.eat_if(|c: char| c.is_digit(8)) {
                        break;
                    }
                }
                let digits = self.s.from(start);
                let code = u32::from_str_radix(digits, 8)
                    .map_err(|_| Error::new(line, ErrorKind::InvalidEscape(format!("\\{digits}"))))?;
                buffer.push_code(code, &format!("\\{digits}"), line)?;
            }
            'x' => {
                let code = self.hex_digits(2, 'x', line)?;
                buffer.push_code(code, &format!("\\x{code:02x}"), line)?;
            }
            'u' if matches!(buffer, Buffer::Str(_)) => {
                let code = self.hex_digits(4, 'u', line)?;
                buffer.push_code(code, &format!("\\u{code:04x}"), line)?;
            }
            'U' if matches!(buffer, Buffer::Str(_)) => {
                let code = self.hex_digits(8, 'U', line)?;
                buffer.push_code(code, &format!("\\U{code:08x}"), line)?;
            }
            'N' if matches!(buffer, Buffer::Str(_)) => {
                let start = self.s.cursor() - 2;
                let closed = self.s.eat_if('{')
                    && !self.s.eat_while(|c: char| !matches!(c, '}' | '\r' | '\n')).is_empty()
                    && self.s.eat_if('}');
                let escape = self.s.from(start).to_string();
                if !closed {
                    return Err(Error::new(line, ErrorKind::InvalidEscape(escape)));
                }
                return Ok(Some(escape));
            }
            // Unknown escapes are kept verbatim.
            other => {
                buffer.push_char('\\', line)?;
                buffer.push_char(other, line)?;
            }
        }
        Ok(None)
    }

    fn hex_digits(&mut self, count: usize, escape: char, line: usize) -> Result<u32, Error> {
        let start = self.s.cursor();
        for _ in 0..count {
            if !self.s.eat_if(|c: char| c.is_ascii_hexdigit()) {
                let digits = self.s.from(start);
                return Err(Error::new(
                    line,
                    ErrorKind::InvalidEscape(format!("\\{escape}{digits}")),
                ));
            }
        }
        u32::from_str_radix(self.s.from(start), 16).map_err(|_| {
            Error::new(
                line,
                ErrorKind::InvalidEscape(format!("\\{escape}{}", self.s.from(start))),
            )
        })
    }
}

/// The decoded contents of a string or bytes literal.
enum Buffer {
    Str(String),
    Bytes(Vec<u8>),
}

impl Buffer {
    /// Push a character from the source text.
    fn push_char(&mut self, c: char, line: usize) -> Result<(), Error> {
        match self {
            Self::Str(value) => value.push(c),
            Self::Bytes(value) => {
                let byte = u8::try_from(c)
                    .ok()
                    .filter(u8::is_ascii)
                    .ok_or(Error::new(line, ErrorKind::NonAsciiBytes))?;
                value.push(byte);
            }
        }
        Ok(())
    }

    /// Push a character given by a numeric escape sequence.
    fn push_code(&mut self, code: u32, escape: &str, line: usize) -> Result<(), Error> {
        let invalid = || Error::new(line, ErrorKind::InvalidEscape(escape.to_string()));
        match self {
            Self::Str(value) => value.push(char::from_u32(code).ok_or_else(invalid)?),
            Self::Bytes(value) => value.push(u8::try_from(code).map_err(|_| invalid())?),
        }
        Ok(())
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_string_prefix(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "br" | "rb" | "f" | "fr" | "rf" | "t" | "tr" | "rt"
    )
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn kinds(source: &str) -> Vec<Vec<TokenKind>> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|line| line.tokens.into_iter().map(|token| token.kind).collect())
            .collect()
    }

    fn string(value: &str) -> TokenKind {
        TokenKind::String(StrToken {
            value: StrValue::Str(value.to_string()),
            formatted: false,
            named_escape: None,
        })
    }

    #[test]
    fn logical_lines() {
        let source = indoc! {r#"
            # A comment
            import os

            x = (
                1,  # one
                2,
            )
            if x:
                y = 1
            z = 1 + \
                2
        "#};
        let lines = tokenize(source).unwrap();
        let summary: Vec<_> = lines
            .iter()
            .map(|line| (line.line, line.indent, line.tokens.len()))
            .collect();
        assert_eq!(
            summary,
            vec![(2, 0, 2), (4, 0, 8), (8, 0, 3), (9, 4, 3), (10, 0, 5)]
        );
    }

    #[test]
    fn strings() {
        let source = indoc! {r#"
            a = 'single' "double"
            b = r"raw \d \" end"
            c = """triple
            quoted"""
            d = "esc\t\x41é\101\n"
            e = b"by\xfftes"
            f = f"{x}"
        "#};
        let lines = kinds(source);
        assert_eq!(lines[0][2], string("single"));
        assert_eq!(lines[0][3], string("double"));
        assert_eq!(lines[1][2], string(r#"raw \d \" end"#));
        assert_eq!(lines[2][2], string("triple\nquoted"));
        assert_eq!(lines[3][2], string("esc\tAéA\n"));
        assert_eq!(
            lines[4][2],
            TokenKind::String(StrToken {
                value: StrValue::Bytes(b"by\xfftes".to_vec()),
                formatted: false,
                named_escape: None,
            })
        );
        assert!(matches!(
            &lines[5][2],
            TokenKind::String(StrToken { formatted: true, .. })
        ));
    }

    #[test]
    fn named_escapes() {
        let lines = kinds("a = '\\N{BULLET} \\N{EM DASH}'\nb = b'\\N{x}'\nc = r'\\N{x}'\n");
        assert!(matches!(
            &lines[0][2],
            TokenKind::String(StrToken { named_escape: Some(escape), .. })
                if escape == r"\N{BULLET}"
        ));
        assert_eq!(
            lines[1][2],
            TokenKind::String(StrToken {
                value: StrValue::Bytes(br"\N{x}".to_vec()),
                formatted: false,
                named_escape: None,
            })
        );
        assert_eq!(lines[2][2], string(r"\N{x}"));

        let err = tokenize("x = '\\N'\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::InvalidEscape(r"\N".to_string())));
        let err = tokenize("x = '\\N{}'\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::InvalidEscape(r"\N{".to_string())));
    }

    #[test]
    fn numbers_and_operators() {
        let lines = kinds("x = -0x_ff, 1.5e-3, .5, 10j, a**=2\n");
        assert_eq!(
            lines[0],
            vec![
                TokenKind::Name("x".to_string()),
                TokenKind::Op("="),
                TokenKind::Op("-"),
                TokenKind::Number("0x_ff".to_string()),
                TokenKind::Op(","),
                TokenKind::Number("1.5e-3".to_string()),
                TokenKind::Op(","),
                TokenKind::Number(".5".to_string()),
                TokenKind::Op(","),
                TokenKind::Number("10j".to_string()),
                TokenKind::Op(","),
                TokenKind::Name("a".to_string()),
                TokenKind::Op("**="),
                TokenKind::Number("2".to_string()),
            ]
        );
    }

    #[test]
    fn errors() {
        let err = tokenize("x = 'abc\ny = 1\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::UnterminatedString));

        let err = tokenize("x = [1,\n2\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::UnclosedBracket('[')));

        let err = tokenize("x = (1]\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::UnmatchedBracket(']')));

        let err = tokenize("x = 1 $ 2\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::UnexpectedCharacter('$')));

        let err = tokenize("x = b'ä'\n").unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::NonAsciiBytes));
    }
}
