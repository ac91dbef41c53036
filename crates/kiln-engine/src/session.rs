//! Per-compilation state shared by the builder and the deferred queue:
//! resolution, conversion, the graph under construction and its identifiers.

use crate::convert::ConversionPipeline;
use crate::error::CompileError;
use crate::evaluator::{EvalTarget, Evaluator};
use crate::extension::Evaluated;
use crate::graph::{ObjectGraph, ObjectRegistry};
use crate::namespace::NamespaceResolver;
use crate::registry::{PropertyKind, TypeLocator};
use crate::value::{ObjectId, Value};

pub(crate) struct Session<'l> {
    pub resolver: NamespaceResolver<'l>,
    pub pipeline: ConversionPipeline<'l>,
    pub graph: ObjectGraph,
    pub names: ObjectRegistry,
}

impl<'l> Session<'l> {
    pub fn new(locator: &'l dyn TypeLocator, default_namespaces: impl IntoIterator<Item = String>) -> Self {
        Self {
            resolver: NamespaceResolver::new(locator, default_namespaces),
            pipeline: ConversionPipeline::new(locator),
            graph: ObjectGraph::new(),
            names: ObjectRegistry::new(),
        }
    }

    pub fn evaluate(&self, text: &str, target: &EvalTarget<'_>) -> Result<Evaluated, CompileError> {
        Evaluator { resolver: &self.resolver, graph: &self.graph, names: &self.names }.evaluate(text, target)
    }

    /// Fail early if `object` has no property `name`.
    pub fn require_property(&self, object: ObjectId, name: &str) -> Result<(), CompileError> {
        let descriptor = self
            .graph
            .descriptor(object)
            .ok_or_else(|| CompileError::syntax(format!("object {} is not in the graph", object)))?;
        match descriptor.property(name) {
            Some(_) => Ok(()),
            None => Err(CompileError::PropertyNotFound {
                owner: descriptor.name().to_string(),
                property: name.to_string(),
            }),
        }
    }

    /// Convert and store `value` according to the property's kind. `key` is
    /// the declared key of the element being assigned, if any.
    pub fn assign(&mut self, object: ObjectId, name: &str, value: Value, key: Option<&str>) -> Result<(), CompileError> {
        let Some(descriptor) = self.graph.descriptor(object).cloned() else {
            return Err(CompileError::syntax(format!("object {} is not in the graph", object)));
        };
        let Some(property) = descriptor.property(name) else {
            return Err(CompileError::PropertyNotFound {
                owner: descriptor.name().to_string(),
                property: name.to_string(),
            });
        };
        let mismatch = || CompileError::InstanceMismatch { owner: descriptor.name().to_string(), object };

        log::trace!("{}.{} ({}) <- {:?}", object, name, property.kind().shape(), value);
        let applied = match property.kind() {
            PropertyKind::Scalar { ty, set } => {
                let value = self.pipeline.convert(value, ty, &mut self.graph)?;
                set(self.graph.instance_mut(object).ok_or_else(mismatch)?, value)
            }
            PropertyKind::Collection { element, push } => {
                let value = self.pipeline.convert(value, element, &mut self.graph)?;
                push(self.graph.instance_mut(object).ok_or_else(mismatch)?, value)
            }
            PropertyKind::List { push } => push(self.graph.instance_mut(object).ok_or_else(mismatch)?, value),
            PropertyKind::Map { key: key_type, value: value_type, insert } => {
                let Some(key) = key else {
                    return Err(CompileError::MissingKey {
                        owner: descriptor.name().to_string(),
                        property: name.to_string(),
                    });
                };
                let key = self.pipeline.convert(Value::from(key), key_type, &mut self.graph)?;
                let value = self.pipeline.convert(value, value_type, &mut self.graph)?;
                insert(self.graph.instance_mut(object).ok_or_else(mismatch)?, key, value)
            }
        };
        applied.ok_or_else(mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing;

    fn session(registry: &crate::registry::TypeRegistry) -> Session<'_> {
        Session::new(registry, [testing::NS.to_string()])
    }

    fn create(session: &mut Session<'_>, name: &str) -> ObjectId {
        let descriptor = session.resolver.find_type(name).unwrap();
        let instance = descriptor.instantiate().unwrap();
        session.graph.insert(descriptor, instance)
    }

    #[test]
    fn scalar_assignment_converts() {
        let registry = testing::registry();
        let mut session = session(&registry);
        let item = create(&mut session, "Item");
        session.assign(item, "Value", Value::from("12"), None).unwrap();
        assert_eq!(session.graph.get::<testing::Item>(item).unwrap().value, 12);
    }

    #[test]
    fn map_assignment_requires_a_key() {
        let registry = testing::registry();
        let mut session = session(&registry);
        let root = create(&mut session, "Root");
        let item = create(&mut session, "Item");

        let err = session.assign(root, "Map", Value::Object(item), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);

        session.assign(root, "Map", Value::Object(item), Some("a")).unwrap();
        assert_eq!(session.graph.get::<testing::Root>(root).unwrap().map.get("a"), Some(&Value::Object(item)));
    }

    #[test]
    fn collection_rejects_wrong_element_type() {
        let registry = testing::registry();
        let mut session = session(&registry);
        let menu = create(&mut session, "Menu");
        let label = create(&mut session, "Label");
        let err = session.assign(menu, "Items", Value::Object(label), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn unknown_property() {
        let registry = testing::registry();
        let mut session = session(&registry);
        let label = create(&mut session, "Label");
        let err = session.assign(label, "Colour", Value::from("red"), None).unwrap_err();
        assert_eq!(err.to_string(), "type `Label` has no property `Colour`");
    }
}
