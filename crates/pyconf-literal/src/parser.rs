//! Evaluate a sequence of tokens as a Python literal expression.

use crate::error::{Error, ErrorKind};
use crate::lexer::{StrValue, Token, TokenKind};
use crate::literal::PyLiteral;

/// The deepest nesting of brackets and unary operators, matching CPython's parser limit.
const MAX_DEPTH: usize = 200;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// The line reported when the tokens run out.
    line: usize,
    depth: usize,
}

/// Evaluate an expression list, e.g. the right-hand side of an assignment.
///
/// A bare comma-separated list is a tuple, like in Python.
pub(crate) fn evaluate(tokens: &[Token], line: usize) -> Result<PyLiteral, Error> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        line,
        depth: 0,
    };
    let first = parser.expression()?;
    let value = if parser.peek().is_some_and(|token| token.is_op(",")) {
        let mut items = vec![first];
        while parser.eat_op(",") {
            if parser.peek().is_none() {
                break;
            }
            items.push(parser.expression()?);
        }
        PyLiteral::Tuple(items)
    } else {
        first
    };
    if let Some(token) = parser.peek() {
        return Err(not_a_literal(token));
    }
    Ok(value)
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        self.line = token.line;
        Some(token)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.peek().is_some_and(|token| token.is_op(op)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), Error> {
        if self.eat_op(op) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(not_a_literal(token)),
            None => Err(self.end_of_input()),
        }
    }

    fn end_of_input(&self) -> Error {
        Error::new(self.line, ErrorKind::NotALiteral("end of statement".to_string()))
    }

    fn expression(&mut self) -> Result<PyLiteral, Error> {
        if self.depth == MAX_DEPTH {
            return Err(Error::new(self.line, ErrorKind::TooDeeplyNested(MAX_DEPTH)));
        }
        self.depth += 1;
        let value = self.operand();
        self.depth -= 1;
        value
    }

    fn operand(&mut self) -> Result<PyLiteral, Error> {
        let Some(token) = self.next().cloned() else {
            return Err(self.end_of_input());
        };
        match token.kind {
            TokenKind::Op(op @ ("-" | "+")) => {
                let operand = self.expression()?;
                match (op, operand) {
                    ("+", operand @ (PyLiteral::Int(_) | PyLiteral::Float(_))) => Ok(operand),
                    (_, PyLiteral::Int(value)) => value.checked_neg().map(PyLiteral::Int).ok_or(
                        Error::new(token.line, ErrorKind::IntegerOverflow(format!("-{value}"))),
                    ),
                    (_, PyLiteral::Float(value)) => Ok(PyLiteral::Float(-value)),
                    (_, operand) => Err(Error::new(
                        token.line,
                        ErrorKind::NotALiteral(format!("`{op}` applied to a {}", operand.type_name())),
                    )),
                }
            }
            TokenKind::Op("(") => {
                let (mut items, comma) = self.items(")")?;
                if items.len() == 1 && !comma {
                    Ok(items.remove(0))
                } else {
                    Ok(PyLiteral::Tuple(items))
                }
            }
            TokenKind::Op("[") => {
                let (items, _) = self.items("]")?;
                Ok(PyLiteral::List(items))
            }
            TokenKind::Op("{") => self.dict_or_set(token.line),
            TokenKind::Name(ref name) => match name.as_str() {
                "True" => Ok(PyLiteral::Bool(true)),
                "False" => Ok(PyLiteral::Bool(false)),
                "None" => Ok(PyLiteral::None),
                _ => Err(not_a_literal(&token)),
            },
            TokenKind::Number(ref text) => parse_number(text, token.line),
            TokenKind::String(_) => self.strings(&token),
            TokenKind::Op(_) => Err(not_a_literal(&token)),
        }
    }

    /// Comma-separated items up to the closing bracket, allowing a trailing comma.
    ///
    /// Also returns whether any comma was seen, to tell `(1)` from `(1,)`.
    fn items(&mut self, close: &str) -> Result<(Vec<PyLiteral>, bool), Error> {
        let mut items = Vec::new();
        let mut comma = false;
        loop {
            if self.eat_op(close) {
                return Ok((items, comma));
            }
            items.push(self.expression()?);
            if self.eat_op(",") {
                comma = true;
                continue;
            }
            self.expect_op(close)?;
            return Ok((items, comma));
        }
    }

    fn dict_or_set(&mut self, line: usize) -> Result<PyLiteral, Error> {
        if self.eat_op("}") {
            return Ok(PyLiteral::Dict(Vec::new()));
        }

        let first = self.expression()?;
        if self.eat_op(":") {
            let mut pairs = vec![(hashable(first, line)?, self.expression()?)];
            while self.eat_op(",") {
                if self.eat_op("}") {
                    return Ok(PyLiteral::Dict(pairs));
                }
                let key = hashable(self.expression()?, self.line)?;
                self.expect_op(":")?;
                pairs.push((key, self.expression()?));
            }
            self.expect_op("}")?;
            return Ok(PyLiteral::Dict(pairs));
        }

        let mut items = vec![hashable(first, line)?];
        if self.eat_op(",") {
            let (rest, _) = self.items("}")?;
            for item in rest {
                items.push(hashable(item, self.line)?);
            }
        } else {
            self.expect_op("}")?;
        }
        Ok(PyLiteral::Set(items))
    }

    /// Adjacent string literals are concatenated, e.g. `"a" "b"` is `"ab"`.
    fn strings(&mut self, first: &Token) -> Result<PyLiteral, Error> {
        let mut value: Option<StrValue> = None;
        let mut token = first.clone();
        loop {
            let TokenKind::String(string) = &token.kind else {
                break;
            };
            if string.formatted {
                return Err(Error::new(
                    token.line,
                    ErrorKind::NotALiteral("an f-string".to_string()),
                ));
            }
            if let Some(escape) = &string.named_escape {
                return Err(Error::new(
                    token.line,
                    ErrorKind::NamedEscape(escape.clone()),
                ));
            }
            value = Some(match (value, &string.value) {
                (None, next) => next.clone(),
                (Some(StrValue::Str(mut acc)), StrValue::Str(next)) => {
                    acc.push_str(next);
                    StrValue::Str(acc)
                }
                (Some(StrValue::Bytes(mut acc)), StrValue::Bytes(next)) => {
                    acc.extend_from_slice(next);
                    StrValue::Bytes(acc)
                }
                (Some(_), _) => return Err(Error::new(token.line, ErrorKind::MixedBytesAndStr)),
            });

            match self.peek() {
                Some(next) if matches!(next.kind, TokenKind::String(_)) => {
                    token = next.clone();
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Ok(match value {
            Some(StrValue::Bytes(bytes)) => PyLiteral::Bytes(bytes),
            Some(StrValue::Str(string)) => PyLiteral::Str(string),
            None => PyLiteral::Str(String::new()),
        })
    }
}

fn hashable(value: PyLiteral, line: usize) -> Result<PyLiteral, Error> {
    if value.is_hashable() {
        Ok(value)
    } else {
        Err(Error::new(
            line,
            ErrorKind::NotALiteral(format!("an unhashable {}", value.type_name())),
        ))
    }
}

fn not_a_literal(token: &Token) -> Error {
    let found = match &token.kind {
        TokenKind::Name(name) => format!("name `{name}`"),
        TokenKind::Op(op) => format!("`{op}`"),
        TokenKind::Number(number) => format!("number `{number}`"),
        TokenKind::String(_) => "a string".to_string(),
    };
    Error::new(token.line, ErrorKind::NotALiteral(found))
}

/// Parse the text of a Python number literal.
fn parse_number(text: &str, line: usize) -> Result<PyLiteral, Error> {
    let invalid = || Error::new(line, ErrorKind::InvalidNumber(text.to_string()));
    if text.contains("__") || text.ends_with('_') {
        return Err(invalid());
    }
    let digits = text.replace('_', "");

    if digits.ends_with(['j', 'J']) {
        return Err(Error::new(
            line,
            ErrorKind::NotALiteral(format!("complex number `{text}`")),
        ));
    }

    let radix = match digits.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let rest = &digits[2..];
        if rest.is_empty() || !rest.chars().all(|c| c.is_digit(radix)) {
            return Err(invalid());
        }
        return i128::from_str_radix(rest, radix)
            .map(PyLiteral::Int)
            .map_err(|_| Error::new(line, ErrorKind::IntegerOverflow(text.to_string())));
    }

    if digits.contains(['.', 'e', 'E']) {
        return digits
            .parse::<f64>()
            .map(PyLiteral::Float)
            .map_err(|_| invalid());
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    // `007` is a syntax error, `000` is not.
    if digits.len() > 1 && digits.starts_with('0') && digits.chars().any(|c| c != '0') {
        return Err(invalid());
    }
    digits
        .parse::<i128>()
        .map(PyLiteral::Int)
        .map_err(|_| Error::new(line, ErrorKind::IntegerOverflow(text.to_string())))
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use crate::lexer::tokenize;

    use super::*;

    fn eval(source: &str) -> Result<PyLiteral, Error> {
        let lines = tokenize(source)?;
        let line = &lines[0];
        evaluate(&line.tokens, line.line)
    }

    fn repr(source: &str) -> String {
        eval(source).unwrap().repr()
    }

    #[test]
    fn scalars() {
        assert_eq!(repr("'1.2' '.3'"), "'1.2.3'");
        assert_eq!(repr("b'a' b'b'"), "b'ab'");
        assert_eq!(repr("-1_000"), "-1000");
        assert_eq!(repr("+0x10"), "16");
        assert_eq!(repr("0o17"), "15");
        assert_eq!(repr("0b101"), "5");
        assert_eq!(repr("1.5"), "1.5");
        assert_eq!(repr("-2e3"), "-2000.0");
        assert_eq!(repr("True"), "True");
        assert_eq!(repr("None"), "None");
        assert_eq!(repr("000"), "0");
    }

    #[test]
    fn containers() {
        assert_eq!(repr("1, 2"), "(1, 2)");
        assert_eq!(repr("1,"), "(1,)");
        assert_eq!(repr("(1)"), "1");
        assert_eq!(repr("(1,)"), "(1,)");
        assert_eq!(repr("()"), "()");
        assert_eq!(repr("[1, 'a', [None],]"), "[1, 'a', [None]]");
        assert_eq!(repr("{}"), "{}");
        assert_eq!(repr("{'a': 1, 'b': (2, 3),}"), "{'a': 1, 'b': (2, 3)}");
        assert_eq!(repr("{1, 2}"), "{1, 2}");
        assert_eq!(repr("(\n  1,\n  2,\n)"), "(1, 2)");
    }

    #[test]
    fn not_literals() {
        assert_snapshot!(eval("get_version()").unwrap_err(), @"line 1: Expected a literal value, found name `get_version`");
        assert_snapshot!(eval("'1.0' + suffix").unwrap_err(), @"line 1: Expected a literal value, found `+`");
        assert_snapshot!(eval("f'{x}'").unwrap_err(), @"line 1: Expected a literal value, found an f-string");
        assert_snapshot!(eval("'a' b'b'").unwrap_err(), @"line 1: Cannot mix bytes and string literals");
        assert_snapshot!(eval("{[1]: 2}").unwrap_err(), @"line 1: Expected a literal value, found an unhashable list");
        assert_snapshot!(eval("-'a'").unwrap_err(), @"line 1: Expected a literal value, found `-` applied to a str");
        assert_snapshot!(eval("1j").unwrap_err(), @"line 1: Expected a literal value, found complex number `1j`");
        assert_snapshot!(eval("007").unwrap_err(), @"line 1: Invalid number literal `007`");
        assert_snapshot!(eval("[1, 2").unwrap_err(), @"line 1: Bracket `[` was never closed");
    }

    #[test]
    fn nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(repr(&nested(MAX_DEPTH - 1)), "1");
        assert_eq!(repr(&format!("{}1", "-".repeat(MAX_DEPTH - 1))), "-1");

        let err = eval(&nested(100_000)).unwrap_err();
        assert_eq!(err, Error::new(1, ErrorKind::TooDeeplyNested(MAX_DEPTH)));
        let err = eval(&format!("[{}]", "-".repeat(100_000))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooDeeplyNested(MAX_DEPTH));
        assert_snapshot!(
            eval(&format!("{{'a': {}}}", nested(MAX_DEPTH))).unwrap_err(),
            @"line 1: Expression is nested more than 200 levels deep"
        );
    }

    #[test]
    fn overflow() {
        let big = "1".repeat(50);
        assert_eq!(
            eval(&big).unwrap_err(),
            Error::new(1, ErrorKind::IntegerOverflow(big.clone()))
        );
    }
}
