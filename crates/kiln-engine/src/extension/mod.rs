//! Markup extensions: `{Name ...}` expressions that compute attribute and
//! text values, and may ask to be re-run once identifiers are declared.

pub mod builtin;

use std::collections::BTreeSet;

use crate::error::CompileError;
use crate::graph::{ObjectGraph, ObjectRegistry};
use crate::value::{ObjectId, Value};

/// A live markup extension, built by its descriptor's factory from the
/// evaluated arguments.
pub trait MarkupExtension {
    fn provide_value(&self, cx: &ExtensionContext<'_>) -> Result<Evaluated, CompileError>;
}

/// Outcome of evaluating a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Value(Value),
    /// Leave the property untouched.
    Nothing,
    /// Re-evaluate once every listed identifier is registered.
    Deferred(BTreeSet<String>),
}

// ── ExtensionArgs ─────────────────────────────────────────────────────────

/// Evaluated arguments, positional first, then named in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionArgs {
    pub positional: Vec<Value>,
    pub named: Vec<(String, Value)>,
}

impl ExtensionArgs {
    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn named(&self, name: &str) -> Option<&Value> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The first positional argument, else the named argument `name`.
    pub fn first_or_named(&self, name: &str) -> Option<&Value> {
        self.positional(0).or_else(|| self.named(name))
    }
}

// ── ExtensionContext ──────────────────────────────────────────────────────

/// What an extension may read while providing its value.
pub struct ExtensionContext<'a> {
    pub(crate) property: &'a str,
    pub(crate) target: ObjectId,
    pub(crate) data_context: Option<&'a Value>,
    pub(crate) graph: &'a ObjectGraph,
    pub(crate) names: &'a ObjectRegistry,
    pub(crate) can_defer: bool,
    pub(crate) expression: &'a str,
}

impl<'a> ExtensionContext<'a> {
    /// Name of the property being assigned.
    pub fn property(&self) -> &str {
        self.property
    }

    /// Object owning the property being assigned.
    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// Nearest non-null data context, else the one passed to the compiler.
    pub fn data_context(&self) -> Option<&Value> {
        self.data_context
    }

    pub fn graph(&self) -> &ObjectGraph {
        self.graph
    }

    pub fn lookup(&self, id: &str) -> Option<&Value> {
        self.names.get(id)
    }

    pub fn can_defer(&self) -> bool {
        self.can_defer
    }

    /// Ask to be re-evaluated once `ids` are all declared.
    pub fn defer<I, S>(&self, ids: I) -> Result<Evaluated, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.can_defer {
            return Err(CompileError::DeferredAfterEnd { expression: self.expression.to_string() });
        }
        Ok(Evaluated::Deferred(ids.into_iter().map(Into::into).collect()))
    }
}
