use tracing::trace;

use crate::error::Error;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::literal::PyLiteral;
use crate::parser::evaluate;

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// The module-level assignments of a Python source file, found without executing it.
///
/// Only simple assignments to names are recorded (`x = ...`, `x = y = ...` and `x: T = ...`).
/// Statements nested in blocks, augmented assignments and assignments to attributes or
/// subscripts are ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticModule {
    assignments: Vec<Assignment>,
}

/// An assignment statement whose value has not been evaluated yet.
#[derive(Debug, Clone)]
struct Assignment {
    /// The 1-based line of the statement.
    line: usize,
    /// The names bound by the statement, e.g. `a` and `b` for `a = b = 1`.
    targets: Vec<String>,
    value: Vec<Token>,
}

impl Assignment {
    fn binds(&self, name: &str) -> bool {
        self.targets.iter().any(|target| target == name)
    }

    fn evaluate(&self) -> Result<PyLiteral, Error> {
        evaluate(&self.value, self.line)
    }
}

impl StaticModule {
    /// Tokenize a module and collect its top-level assignments.
    ///
    /// Fails only if the source can't be tokenized, e.g. on an unterminated string. Values are
    /// evaluated lazily, so a module can assign non-literal values to other names.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut assignments = Vec::new();
        for line in tokenize(source)? {
            if line.indent != 0 {
                continue;
            }
            for statement in line.tokens.split(|token| token.is_op(";")) {
                if let Some(assignment) = parse_assignment(statement) {
                    assignments.push(assignment);
                }
            }
        }
        trace!("Found {} module-level assignments", assignments.len());
        Ok(Self { assignments })
    }

    /// The value of `name`, from the first assignment to it with a literal value.
    ///
    /// Returns `None` if the module never assigns `name`. If none of the assignments has a
    /// literal value, the error of the first one is returned.
    pub fn get(&self, name: &str) -> Result<Option<PyLiteral>, Error> {
        let mut first_error = None;
        for assignment in self.assignments.iter().filter(|assignment| assignment.binds(name)) {
            match assignment.evaluate() {
                Ok(value) => return Ok(Some(value)),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(None), Err)
    }
}

fn parse_assignment(tokens: &[Token]) -> Option<Assignment> {
    let first = tokens.first()?;
    match &first.kind {
        TokenKind::Name(name) if !KEYWORDS.contains(&name.as_str()) => {}
        _ => return None,
    }

    // The `=` at bracket depth zero, stopping at `lambda` whose default arguments also use `=`.
    let mut depth = 0usize;
    let mut equals = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Op("(" | "[" | "{") => depth += 1,
            TokenKind::Op(")" | "]" | "}") => depth = depth.saturating_sub(1),
            TokenKind::Op("=") if depth == 0 => equals.push(index),
            _ if token.is_name("lambda") => break,
            _ => {}
        }
    }
    let &last = equals.last()?;

    let mut targets = Vec::new();
    let mut start = 0;
    for (position, &end) in equals.iter().enumerate() {
        match &tokens[start..end] {
            [
                Token {
                    kind: TokenKind::Name(name),
                    ..
                },
            ] if !KEYWORDS.contains(&name.as_str()) => targets.push(name.clone()),
            // An annotated assignment, `name: type = value`.
            [
                Token {
                    kind: TokenKind::Name(name),
                    ..
                },
                colon,
                ..,
            ] if position == 0 && equals.len() == 1 && colon.is_op(":") => {
                targets.push(name.clone());
            }
            _ => {}
        }
        start = end + 1;
    }

    Some(Assignment {
        line: first.line,
        targets,
        value: tokens[last + 1..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::*;

    const SOURCE: &str = indoc! {r#"
        """Package docstring."""
        import os
        from ._meta import get_version

        __all__ = ["main"]
        __version__ = VERSION = "1.2.3"
        __author__: str = 'Jane Doe'
        version_info = (1, 2, 3)
        computed = get_version()
        a = 1; b = [2,
            3]

        if os.environ.get("X"):
            __version__ = "9.9.9"

        def main(x=1):
            return x

        callback = lambda y=2: y
        __version__ = "0.0.0"
        counter += 1
        obj.attr = 5
        items[0] = 1
    "#};

    #[test]
    fn first_assignment_wins() {
        let module = StaticModule::parse(SOURCE).unwrap();
        assert_eq!(
            module.get("__version__").unwrap(),
            Some(PyLiteral::Str("1.2.3".to_string()))
        );
        assert_eq!(
            module.get("VERSION").unwrap(),
            Some(PyLiteral::Str("1.2.3".to_string()))
        );
    }

    #[test]
    fn targets() {
        let module = StaticModule::parse(SOURCE).unwrap();
        let names: Vec<_> = module
            .assignments
            .iter()
            .map(|assignment| assignment.targets.join("="))
            .collect();
        assert_eq!(
            names,
            vec![
                "__all__",
                "__version__=VERSION",
                "__author__",
                "version_info",
                "computed",
                "a",
                "b",
                "callback",
                "__version__",
                "",
                "",
            ]
        );
    }

    #[test]
    fn values() {
        let module = StaticModule::parse(SOURCE).unwrap();
        assert_eq!(module.get("__author__").unwrap().unwrap().to_string(), "Jane Doe");
        assert_eq!(module.get("version_info").unwrap().unwrap().repr(), "(1, 2, 3)");
        assert_eq!(module.get("b").unwrap().unwrap().repr(), "[2, 3]");
        assert_eq!(module.get("x").unwrap(), None);
        assert_eq!(module.get("main").unwrap(), None);
        assert_snapshot!(
            module.get("computed").unwrap_err(),
            @"line 9: Expected a literal value, found name `get_version`"
        );
        assert_snapshot!(
            module.get("callback").unwrap_err(),
            @"line 19: Expected a literal value, found name `lambda`"
        );
    }

    #[test]
    fn first_literal_assignment() {
        let module = StaticModule::parse(indoc! {r#"
            __version__ = get_version()
            __version__ = "2.0"
            fallback = read()
            fallback = other()
        "#})
        .unwrap();
        assert_eq!(module.get("__version__").unwrap().unwrap().to_string(), "2.0");
        assert_snapshot!(
            module.get("fallback").unwrap_err(),
            @"line 3: Expected a literal value, found name `read`"
        );
    }

    #[test]
    fn named_escape_elsewhere_in_module() {
        let module = StaticModule::parse(indoc! {r#"
            __version__ = "1.0"
            BULLET = "\N{BULLET} "
        "#})
        .unwrap();
        assert_eq!(module.get("__version__").unwrap().unwrap().to_string(), "1.0");
        assert_snapshot!(
            module.get("BULLET").unwrap_err(),
            @r"line 2: Named Unicode escape `\N{BULLET}` is not supported"
        );
    }

    #[test]
    fn tokenizer_errors() {
        let err = StaticModule::parse("x = '''never closed\n").unwrap_err();
        assert_snapshot!(err, @"line 1: Unterminated string literal");
    }
}
