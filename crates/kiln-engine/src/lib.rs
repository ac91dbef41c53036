//! Kiln engine crate.
//!
//! Compiles markup documents into live object graphs. Types are described
//! once in a [`TypeRegistry`]; every compilation resolves element and
//! attribute names against it, evaluates `{Extension ...}` expressions,
//! converts values to the declared property types and links forward
//! references once their identifiers are declared.
//!
//! ```rust,ignore
//! let compiler = Compiler::new(registry).with_default_namespace("urn:app");
//! let document = compiler.compile(r#"<Panel Orientation="Vertical"><Label>Hi</Label></Panel>"#, None)?;
//! let panel: &Panel = document.root().unwrap();
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod extension;
pub mod graph;
pub mod logging;
pub mod namespace;
pub mod registry;
pub mod value;

mod builder;
mod compiler;
mod deferred;
mod evaluator;
mod session;

#[cfg(test)]
mod testing;

pub use compiler::{Compiler, Document};
pub use config::{CancellationToken, CompilerConfig};
pub use convert::{ConversionPipeline, ConvertContext, Converter};
pub use error::{CompileError, ErrorKind};
pub use evaluator::{ESCAPE_PREFIX, ValueText, classify};
pub use extension::{Evaluated, ExtensionArgs, ExtensionContext, MarkupExtension};
pub use graph::{ObjectGraph, ObjectRegistry};
pub use registry::{
    ID_ATTRIBUTE, KEY_ATTRIBUTE, METADATA_NAMESPACE, PropertyKind, TypeBuilder, TypeDescriptor, TypeKey,
    TypeLocator, TypeRegistry,
};
pub use value::{EnumDescriptor, EnumValue, ObjectId, Value, ValueType};
