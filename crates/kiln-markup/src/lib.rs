//! Structural event reader and extension expression parser for **kiln** markup.
//!
//! This crate knows nothing about types, properties or object graphs; it only
//! turns text into events and expressions, so editor tooling can use it
//! without pulling in the compiler.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`event`] | `MarkupEvent`, name splitting helpers |
//! | [`reader`] | `MarkupReader` (quick-xml), `read_events` |
//! | [`expr`] | `Expression`, `Argument`, `parse_expression` |
//! | [`error`] | `MarkupError` |
//!
//! # Quick start
//!
//! ```rust
//! use kiln_markup::{MarkupEvent, parse_expression, read_events};
//!
//! let events = read_events(r#"<Label Text="{Ref title}"/>"#).unwrap();
//! assert_eq!(events[0], MarkupEvent::start("Label"));
//!
//! let expr = parse_expression("{Ref title}").unwrap();
//! assert_eq!(expr.name, "Ref");
//! ```

pub mod error;
pub mod event;
pub mod expr;
pub mod reader;

pub use error::MarkupError;
pub use event::MarkupEvent;
pub use expr::{Argument, Expression, MAX_NESTING, NamedArgument, parse_expression};
pub use reader::{MarkupReader, read_events};
