//! Read the value of module-level assignments from Python source without executing it.
//!
//! Only literal values are supported, matching what Python's `ast.literal_eval` accepts:
//! strings (including implicit concatenation), bytes, integers, floats, `True`, `False`, `None`,
//! and tuples, lists, sets and dicts thereof, plus unary `+` and `-` on numbers.
//!
//! ```text
//! __version__ = "1.2.3"
//! VERSION: tuple[int, ...] = (1, 2, 3)
//! __all__ = __exports__ = ["main"]
//! ```

pub use error::{Error, ErrorKind};
pub use literal::PyLiteral;
pub use module::StaticModule;

mod error;
mod lexer;
mod literal;
mod module;
mod parser;
