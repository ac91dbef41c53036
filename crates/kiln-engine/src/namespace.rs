//! Prefix and default-namespace resolution for element and extension names.

use std::collections::HashMap;
use std::sync::Arc;

use kiln_markup::event::split_prefix;

use crate::error::CompileError;
use crate::registry::{METADATA_NAMESPACE, TypeDescriptor, TypeLocator};

#[derive(Clone, Copy)]
enum Lookup {
    Type,
    Extension,
}

impl Lookup {
    fn matches(self, descriptor: &TypeDescriptor, name: &str) -> bool {
        match self {
            Lookup::Type => descriptor.name() == name,
            Lookup::Extension => descriptor.extension_name() == Some(name),
        }
    }
}

/// Per-document namespace state. Declarations are only accepted while the
/// root element is being opened.
pub struct NamespaceResolver<'l> {
    locator: &'l dyn TypeLocator,
    prefixes: HashMap<String, String>,
    defaults: Vec<String>,
}

impl<'l> NamespaceResolver<'l> {
    pub fn new(locator: &'l dyn TypeLocator, defaults: impl IntoIterator<Item = String>) -> Self {
        Self { locator, prefixes: HashMap::new(), defaults: defaults.into_iter().collect() }
    }

    pub(crate) fn declare_prefix(&mut self, prefix: &str, namespace: &str) {
        log::debug!("xmlns:{} = {}", prefix, namespace);
        self.prefixes.insert(prefix.to_string(), namespace.to_string());
    }

    pub(crate) fn push_default(&mut self, namespace: &str) {
        log::debug!("default namespace {}", namespace);
        self.defaults.push(namespace.to_string());
    }

    pub fn namespace_of(&self, prefix: &str) -> Result<&str, CompileError> {
        self.prefixes
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| CompileError::UnknownPrefix { prefix: prefix.to_string() })
    }

    /// Namespaces to search, in order, and the unqualified name. Unprefixed
    /// names fall back to [`METADATA_NAMESPACE`] after every default.
    pub fn resolve<'n>(&self, name: &'n str) -> Result<(Vec<&str>, &'n str), CompileError> {
        match split_prefix(name) {
            (Some(prefix), local) => Ok((vec![self.namespace_of(prefix)?], local)),
            (None, local) => {
                let mut namespaces: Vec<&str> = self.defaults.iter().map(String::as_str).collect();
                if !namespaces.contains(&METADATA_NAMESPACE) {
                    namespaces.push(METADATA_NAMESPACE);
                }
                Ok((namespaces, local))
            }
        }
    }

    pub fn find_type(&self, name: &str) -> Result<Arc<TypeDescriptor>, CompileError> {
        self.find(name, Lookup::Type)
    }

    pub fn find_extension(&self, name: &str) -> Result<Arc<TypeDescriptor>, CompileError> {
        self.find(name, Lookup::Extension)
    }

    fn find(&self, name: &str, lookup: Lookup) -> Result<Arc<TypeDescriptor>, CompileError> {
        let (namespaces, local) = self.resolve(name)?;
        for namespace in &namespaces {
            let mut matches = self.locator.enumerate(namespace).iter().filter(|d| lookup.matches(d, local));
            let Some(first) = matches.next() else { continue };
            let extra = matches.count();
            if extra > 0 {
                return Err(CompileError::AmbiguousType {
                    name: local.to_string(),
                    namespace: namespace.to_string(),
                    count: extra + 1,
                });
            }
            log::trace!("resolved `{}` to {}", name, first.key());
            return Ok(Arc::clone(first));
        }
        let namespaces = namespaces.into_iter().map(str::to_string).collect();
        Err(match lookup {
            Lookup::Type => CompileError::TypeNotFound { name: local.to_string(), namespaces },
            Lookup::Extension => CompileError::ExtensionNotFound { name: local.to_string(), namespaces },
        })
    }
}
