//! Extensions every registry carries: `{Ref id}`, `{Null}` and
//! `{DataContext Path=a.b}`.

use std::sync::Arc;

use crate::error::CompileError;
use crate::extension::{Evaluated, ExtensionArgs, ExtensionContext, MarkupExtension};
use crate::registry::{METADATA_NAMESPACE, TypeDescriptor};
use crate::value::Value;

/// `{Ref Name}` / `{Ref Name=Name}`: the value declared under that identifier.
/// Defers until it is declared.
pub struct RefExtension {
    name: String,
}

impl RefExtension {
    fn from_args(args: ExtensionArgs) -> Result<Box<dyn MarkupExtension>, String> {
        match args.first_or_named("Name") {
            Some(Value::String(name)) if !name.is_empty() => Ok(Box::new(Self { name: name.clone() })),
            Some(other) => Err(format!("expected an identifier, got {:?}", other)),
            None => Err("missing identifier".to_string()),
        }
    }
}

impl MarkupExtension for RefExtension {
    fn provide_value(&self, cx: &ExtensionContext<'_>) -> Result<Evaluated, CompileError> {
        match cx.lookup(&self.name) {
            Some(value) => Ok(Evaluated::Value(value.clone())),
            None => cx.defer([self.name.as_str()]),
        }
    }
}

/// `{Null}`.
pub struct NullExtension;

impl MarkupExtension for NullExtension {
    fn provide_value(&self, _: &ExtensionContext<'_>) -> Result<Evaluated, CompileError> {
        Ok(Evaluated::Value(Value::Null))
    }
}

/// `{DataContext}` / `{DataContext Path=Owner.Name}`: the effective data
/// context, optionally followed through readable properties of graph objects.
/// Yields nothing when there is no context or the path breaks off.
pub struct DataContextExtension {
    path: Vec<String>,
}

impl DataContextExtension {
    fn from_args(args: ExtensionArgs) -> Result<Box<dyn MarkupExtension>, String> {
        let path = match args.first_or_named("Path") {
            None => Vec::new(),
            Some(Value::String(path)) => path.split('.').map(str::trim).map(str::to_string).collect(),
            Some(other) => return Err(format!("expected a property path, got {:?}", other)),
        };
        if path.iter().any(String::is_empty) {
            return Err("empty segment in property path".to_string());
        }
        Ok(Box::new(Self { path }))
    }
}

impl MarkupExtension for DataContextExtension {
    fn provide_value(&self, cx: &ExtensionContext<'_>) -> Result<Evaluated, CompileError> {
        let Some(mut current) = cx.data_context().cloned() else {
            return Ok(Evaluated::Nothing);
        };
        for segment in &self.path {
            let next = current.as_object().and_then(|id| cx.graph().property(id, segment));
            match next {
                Some(value) => current = value,
                None => {
                    log::debug!("data-context path breaks off at `{}`", segment);
                    return Ok(Evaluated::Nothing);
                }
            }
        }
        Ok(Evaluated::Value(current))
    }
}

pub(crate) fn descriptors() -> Vec<Arc<TypeDescriptor>> {
    vec![
        TypeDescriptor::builder::<RefExtension>(METADATA_NAMESPACE, "RefExtension")
            .extension("Ref", RefExtension::from_args)
            .assemble(),
        TypeDescriptor::builder::<NullExtension>(METADATA_NAMESPACE, "NullExtension")
            .extension("Null", |_| Ok(Box::new(NullExtension) as Box<dyn MarkupExtension>))
            .assemble(),
        TypeDescriptor::builder::<DataContextExtension>(METADATA_NAMESPACE, "DataContextExtension")
            .extension("DataContext", DataContextExtension::from_args)
            .assemble(),
    ]
    .into_iter()
    .map(Arc::new)
    .collect()
}
