//! Compilation entry point and its result.

use std::any::{Any, type_name};
use std::sync::Arc;

use kiln_markup::{MarkupError, MarkupEvent, MarkupReader};

use crate::builder::GraphBuilder;
use crate::config::{CancellationToken, CompilerConfig};
use crate::error::CompileError;
use crate::graph::{ObjectGraph, ObjectRegistry};
use crate::registry::{TypeLocator, TypeRegistry};
use crate::value::{ObjectId, Value};

// ── Compiler ──────────────────────────────────────────────────────────────

/// Compiles markup against a shared, read-only [`TypeLocator`].
///
/// A `Compiler` holds no per-document state; one instance may compile any
/// number of documents, from any number of threads.
#[derive(Clone)]
pub struct Compiler {
    locator: Arc<dyn TypeLocator>,
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(registry: TypeRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    pub fn from_shared(locator: Arc<dyn TypeLocator>) -> Self {
        Self { locator, config: CompilerConfig::default() }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a namespace to search for unprefixed names.
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.default_namespaces.push(namespace.into());
        self
    }

    pub fn strict_metadata(mut self, strict: bool) -> Self {
        self.config.strict_metadata = strict;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.config.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a markup document. `data_context` is the context seen by
    /// elements that have no nearer one.
    pub fn compile(&self, markup: &str, data_context: Option<Value>) -> Result<Document, CompileError> {
        self.compile_events(MarkupReader::new(markup), data_context)
    }

    /// Compile an already tokenized event stream.
    pub fn compile_events<I>(&self, events: I, data_context: Option<Value>) -> Result<Document, CompileError>
    where
        I: IntoIterator<Item = Result<MarkupEvent, MarkupError>>,
    {
        let mut builder = GraphBuilder::new(
            self.locator.as_ref(),
            self.config.default_namespaces.iter().cloned(),
            self.config.strict_metadata,
            data_context,
        );
        for event in events {
            if self.config.is_cancelled() {
                log::debug!("compilation cancelled");
                return Err(CompileError::Cancelled);
            }
            builder.feed(event?)?;
        }
        if self.config.is_cancelled() {
            return Err(CompileError::Cancelled);
        }
        let output = builder.finish()?;
        Ok(Document { graph: output.graph, root: output.root, names: output.names })
    }

    /// Compile and require the root to be a `T`.
    pub fn compile_as<T: Any>(&self, markup: &str, data_context: Option<Value>) -> Result<Document, CompileError> {
        let document = self.compile(markup, data_context)?;
        if document.root::<T>().is_some() {
            return Ok(document);
        }
        let found = match document.root_id().and_then(|id| document.graph.descriptor(id)) {
            Some(descriptor) => format!("`{}`", descriptor.key()),
            None => format!("{:?}", document.root),
        };
        Err(CompileError::RootType { expected: type_name::<T>().to_string(), found })
    }
}

// ── Document ──────────────────────────────────────────────────────────────

/// A successfully compiled document: the graph, its root and its identifiers.
#[derive(Debug)]
pub struct Document {
    graph: ObjectGraph,
    root: Value,
    names: ObjectRegistry,
}

impl Document {
    /// The root object, if it is a `T`.
    pub fn root<T: Any>(&self) -> Option<&T> {
        self.root_id().and_then(|id| self.graph.get::<T>(id))
    }

    pub fn root_mut<T: Any>(&mut self) -> Option<&mut T> {
        let id = self.root_id()?;
        self.graph.get_mut::<T>(id)
    }

    /// The root value. Not an object when the root element was a value factory.
    pub fn root_value(&self) -> &Value {
        &self.root
    }

    pub fn root_id(&self) -> Option<ObjectId> {
        self.root.as_object()
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn names(&self) -> &ObjectRegistry {
        &self.names
    }

    pub fn lookup(&self, id: &str) -> Option<&Value> {
        self.names.get(id)
    }

    /// The object declared under `id`, if it is a `T`.
    pub fn get<T: Any>(&self, id: &str) -> Option<&T> {
        self.lookup(id).and_then(Value::as_object).and_then(|object| self.graph.get::<T>(object))
    }

    pub fn into_parts(self) -> (ObjectGraph, Value, ObjectRegistry) {
        (self.graph, self.root, self.names)
    }
}
