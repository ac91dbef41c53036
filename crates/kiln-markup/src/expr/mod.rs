//! Markup extension expressions: `{Name positional, ..., Named=value, ...}`.
//!
//! Values are unquoted text (trimmed), `'quoted'` text with `\` escapes, or a
//! nested `{...}` expression. Positional arguments must come before named
//! ones.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Argument, Expression, NamedArgument};
pub use parser::{MAX_NESTING, parse_expression};
