//! Built-in descriptors: the boxed-primitive value factories behind the
//! `object`/`string`/`int`/... aliases, and the reserved metadata namespace.

use std::sync::{Arc, LazyLock};

use crate::registry::TypeDescriptor;
use crate::value::{Value, ValueType};

/// Reserved namespace for framework metadata (`Key`, `Id`) and built-in types.
pub const METADATA_NAMESPACE: &str = "urn:kiln:metadata";

/// Metadata attribute naming an element's key in a keyed-mapping property.
pub const KEY_ATTRIBUTE: &str = "Key";

/// Metadata attribute declaring an element's identifier for forward references.
pub const ID_ATTRIBUTE: &str = "Id";

// ── Boxed primitives ──────────────────────────────────────────────────────

/// Wrapper instance behind a boxed-primitive element such as `<int>42</int>`.
/// Replaced by its content when the element closes.
#[derive(Debug, Default)]
pub struct BoxedValue {
    content: Option<Value>,
}

fn boxed(alias: &str, ty: ValueType, empty: Value) -> Arc<TypeDescriptor> {
    let descriptor = TypeDescriptor::builder::<BoxedValue>(METADATA_NAMESPACE, alias)
        .default_constructor()
        .scalar_rw(
            "Content",
            ty,
            |b: &BoxedValue| b.content.clone().unwrap_or_default(),
            |b, v| b.content = Some(v),
        )
        .content_property("Content")
        .value_factory(move |b| b.content.clone().unwrap_or_else(|| empty.clone()))
        .assemble();
    Arc::new(descriptor)
}

static BOXED: LazyLock<Vec<Arc<TypeDescriptor>>> = LazyLock::new(|| {
    vec![
        boxed("object", ValueType::Any, Value::Null),
        boxed("string", ValueType::String, Value::String(String::new())),
        boxed("int", ValueType::Int, Value::Int(0)),
        boxed("double", ValueType::Double, Value::Double(0.0)),
        boxed("float", ValueType::Float, Value::Float(0.0)),
        boxed("char", ValueType::Char, Value::Char('\0')),
        boxed("bool", ValueType::Bool, Value::Bool(false)),
    ]
});

/// The boxed-primitive descriptor for a short alias, if `name` is one.
pub fn boxed_alias(name: &str) -> Option<Arc<TypeDescriptor>> {
    BOXED.iter().find(|d| d.name() == name).cloned()
}

pub(crate) fn boxed_types() -> impl Iterator<Item = Arc<TypeDescriptor>> {
    BOXED.iter().cloned()
}

pub(crate) fn extension_types() -> impl Iterator<Item = Arc<TypeDescriptor>> {
    crate::extension::builtin::descriptors().into_iter()
}
