//! Type registry: the only source of type and property information the
//! compiler consults.
//!
//! A [`TypeLocator`] enumerates [`TypeDescriptor`]s per namespace.
//! [`TypeRegistry`] is the start-up-time implementation: build descriptors
//! once, register them, then share the registry read-only between compilers.

pub mod builtin;
mod descriptor;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use builtin::{BoxedValue, ID_ATTRIBUTE, KEY_ATTRIBUTE, METADATA_NAMESPACE};
pub use descriptor::{
    Constructor, DEFAULT_CONTENT_PROPERTY, DEFAULT_DATA_CONTEXT_PROPERTY, ExtensionDescriptor,
    ExtensionFactory, Getter, Inserter, PropertyDescriptor, PropertyKind, Setter, TypeBuilder,
    TypeDescriptor, ValueFactory,
};

// ── TypeKey ───────────────────────────────────────────────────────────────

/// Namespace-qualified type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub namespace: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

// ── TypeLocator ───────────────────────────────────────────────────────────

/// Enumerates the types visible in a namespace.
///
/// Implementations must be read-only once compilation starts; one locator is
/// shared by every concurrent compilation.
pub trait TypeLocator: Send + Sync {
    /// All descriptors registered under `namespace`, in registration order.
    fn enumerate(&self, namespace: &str) -> &[Arc<TypeDescriptor>];

    /// The first descriptor registered under `key`.
    fn describe(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.enumerate(&key.namespace).iter().find(|d| d.name() == key.name).cloned()
    }
}

// ── TypeRegistry ──────────────────────────────────────────────────────────

/// HashMap-backed [`TypeLocator`].
pub struct TypeRegistry {
    namespaces: HashMap<String, Vec<Arc<TypeDescriptor>>>,
}

impl TypeRegistry {
    /// A registry holding the built-in boxed primitives and extensions
    /// (all in [`METADATA_NAMESPACE`]).
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for descriptor in builtin::boxed_types().chain(builtin::extension_types()) {
            registry.insert(descriptor);
        }
        registry
    }

    /// A registry with nothing in it, not even the built-ins.
    pub fn empty() -> Self {
        Self { namespaces: HashMap::new() }
    }

    /// Register a descriptor. Registering two descriptors with the same key is
    /// allowed; looking that name up later is an ambiguity error.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.insert(Arc::clone(&descriptor));
        descriptor
    }

    fn insert(&mut self, descriptor: Arc<TypeDescriptor>) {
        log::trace!("registering type {}", descriptor.key());
        self.namespaces
            .entry(descriptor.namespace().to_string())
            .or_default()
            .push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeLocator for TypeRegistry {
    fn enumerate(&self, namespace: &str) -> &[Arc<TypeDescriptor>] {
        self.namespaces.get(namespace).map(Vec::as_slice).unwrap_or(&[])
    }
}
