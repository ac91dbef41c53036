//! Conversion of produced values to the static type a property declares.
//!
//! Stages, first applicable wins:
//!
//! | # | Stage | Applies when |
//! |---|-------|--------------|
//! | 1 | identity | the destination accepts the value as is |
//! | 2 | enumeration | string into an enum type |
//! | 3 | literal | string into bool, int, int?, char, char?, double, float |
//! | 4 | source converter | the value is an object whose type declares a converter to the destination |
//! | 5 | destination converter | the destination type declares a converter from the source type |
//!
//! Anything else is [`CompileError::UnsupportedConversion`].

use std::any::Any;

use crate::error::CompileError;
use crate::graph::ObjectGraph;
use crate::registry::{TypeKey, TypeLocator};
use crate::value::{EnumDescriptor, Value, ValueType};

// ── Converter ─────────────────────────────────────────────────────────────

/// Type-level conversion hook, declared with [`TypeBuilder::converter`](crate::registry::TypeBuilder::converter).
///
/// Converters must be pure: the same input gives the same output or the same error.
pub trait Converter: Send + Sync {
    /// Asked when the converter's type is the *source* of a conversion.
    fn can_convert_to(&self, dest: &ValueType) -> bool {
        let _ = dest;
        false
    }

    /// Asked when the converter's type is the *destination* of a conversion.
    fn can_convert_from(&self, source: &ValueType) -> bool {
        let _ = source;
        false
    }

    /// Convert `value` to `dest`. The error string becomes the reason of a
    /// [`CompileError::ConverterFailed`].
    fn convert(&self, value: &Value, dest: &ValueType, cx: &mut ConvertContext<'_>) -> Result<Value, String>;
}

/// What a converter may touch while converting.
pub struct ConvertContext<'a> {
    graph: &'a mut ObjectGraph,
    locator: &'a dyn TypeLocator,
}

impl<'a> ConvertContext<'a> {
    pub fn new(graph: &'a mut ObjectGraph, locator: &'a dyn TypeLocator) -> Self {
        Self { graph, locator }
    }

    pub fn graph(&self) -> &ObjectGraph {
        &*self.graph
    }

    /// Store `instance` as a new object of the registered type `key`.
    pub fn create<T: Any>(&mut self, key: &TypeKey, instance: T) -> Result<Value, String> {
        let descriptor = self
            .locator
            .describe(key)
            .ok_or_else(|| format!("type {} is not registered", key))?;
        Ok(Value::Object(self.graph.insert_object(descriptor, instance)))
    }
}

// ── ConversionPipeline ────────────────────────────────────────────────────

pub struct ConversionPipeline<'l> {
    locator: &'l dyn TypeLocator,
}

impl<'l> ConversionPipeline<'l> {
    pub fn new(locator: &'l dyn TypeLocator) -> Self {
        Self { locator }
    }

    pub fn convert(&self, value: Value, dest: &ValueType, graph: &mut ObjectGraph) -> Result<Value, CompileError> {
        if accepts(&value, dest, graph) {
            return Ok(value);
        }

        if let Value::String(text) = &value {
            if let ValueType::Enum(enumeration) = dest {
                return enumeration.value(text).map(Value::Enum).ok_or_else(|| CompileError::EnumMember {
                    value: text.clone(),
                    enumeration: enumeration.name().to_string(),
                });
            }
            if let Some(parsed) = parse_literal(text, dest) {
                return parsed;
            }
        }

        let source = source_type(&value, graph);

        if let Value::Object(id) = value {
            if let Some(descriptor) = graph.descriptor(id).cloned() {
                if let Some(converter) = descriptor.converter() {
                    if converter.can_convert_to(dest) {
                        log::trace!("converting {} to {} via source converter", id, dest);
                        let mut cx = ConvertContext::new(graph, self.locator);
                        return converter.convert(&value, dest, &mut cx).map_err(|reason| {
                            CompileError::ConverterFailed {
                                owner: descriptor.name().to_string(),
                                value: format!("{:?}", value),
                                to: dest.to_string(),
                                reason,
                            }
                        });
                    }
                }
            }
        }

        if let ValueType::Object(key) = dest {
            if let Some(descriptor) = self.locator.describe(key) {
                if let Some(converter) = descriptor.converter() {
                    if converter.can_convert_from(&source) {
                        log::trace!("converting {:?} to {} via destination converter", value, dest);
                        let mut cx = ConvertContext::new(graph, self.locator);
                        return converter.convert(&value, dest, &mut cx).map_err(|reason| {
                            CompileError::ConverterFailed {
                                owner: descriptor.name().to_string(),
                                value: format!("{:?}", value),
                                to: dest.to_string(),
                                reason,
                            }
                        });
                    }
                }
            }
        }

        Err(CompileError::UnsupportedConversion {
            value: format!("{:?}", value),
            from: source.to_string(),
            to: dest.to_string(),
        })
    }
}

/// Stage 1.
pub(crate) fn accepts(value: &Value, dest: &ValueType, graph: &ObjectGraph) -> bool {
    match (dest, value) {
        (ValueType::Any, _) => true,
        (
            ValueType::String
            | ValueType::Object(_)
            | ValueType::Opaque
            | ValueType::NullableInt
            | ValueType::NullableChar,
            Value::Null,
        ) => true,
        (ValueType::String, Value::String(_)) => true,
        (ValueType::Bool, Value::Bool(_)) => true,
        (ValueType::Int | ValueType::NullableInt, Value::Int(_)) => true,
        (ValueType::Double, Value::Double(_)) => true,
        (ValueType::Float, Value::Float(_)) => true,
        (ValueType::Char | ValueType::NullableChar, Value::Char(_)) => true,
        (ValueType::Enum(e), Value::Enum(v)) => v.enumeration == e.name(),
        (ValueType::Object(key), Value::Object(id)) => {
            graph.descriptor(*id).is_some_and(|d| d.is_assignable_to(key))
        }
        (ValueType::Opaque, Value::Opaque(_)) => true,
        _ => false,
    }
}

/// Stage 3. `None` when `dest` has no literal syntax.
fn parse_literal(text: &str, dest: &ValueType) -> Option<Result<Value, CompileError>> {
    let invalid = |reason: &str| CompileError::InvalidLiteral {
        value: text.to_string(),
        to: dest.to_string(),
        reason: reason.to_string(),
    };
    let parsed = match dest {
        ValueType::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(invalid("expected `true` or `false`"))
            }
        }
        ValueType::NullableInt if text.is_empty() => Ok(Value::Null),
        ValueType::Int | ValueType::NullableInt => {
            text.trim().parse::<i32>().map(Value::Int).map_err(|e| invalid(&e.to_string()))
        }
        ValueType::Double => text.trim().parse::<f64>().map(Value::Double).map_err(|e| invalid(&e.to_string())),
        ValueType::Float => text.trim().parse::<f32>().map(Value::Float).map_err(|e| invalid(&e.to_string())),
        ValueType::NullableChar if text.is_empty() => Ok(Value::Null),
        ValueType::Char | ValueType::NullableChar => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid("expected exactly one character")),
            }
        }
        _ => return None,
    };
    Some(parsed)
}

/// The static type a converter sees for `value`. Enumeration values carry
/// only their enumeration's name.
pub(crate) fn source_type(value: &Value, graph: &ObjectGraph) -> ValueType {
    match value {
        Value::Null => ValueType::Any,
        Value::String(_) => ValueType::String,
        Value::Bool(_) => ValueType::Bool,
        Value::Int(_) => ValueType::Int,
        Value::Double(_) => ValueType::Double,
        Value::Float(_) => ValueType::Float,
        Value::Char(_) => ValueType::Char,
        Value::Enum(e) => ValueType::Enum(EnumDescriptor::new(e.enumeration.clone(), Vec::<String>::new())),
        Value::Object(id) => graph
            .descriptor(*id)
            .map(|d| ValueType::Object(d.key().clone()))
            .unwrap_or(ValueType::Any),
        Value::Opaque(_) => ValueType::Opaque,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::error::ErrorKind;
    use crate::registry::{TypeDescriptor, TypeRegistry};

    const NS: &str = "urn:test";

    #[derive(Debug, Clone, PartialEq)]
    struct Thickness(i32);

    struct ThicknessConverter;

    impl Converter for ThicknessConverter {
        fn can_convert_from(&self, source: &ValueType) -> bool {
            matches!(source, ValueType::String | ValueType::Int)
        }

        fn can_convert_to(&self, dest: &ValueType) -> bool {
            matches!(dest, ValueType::Int)
        }

        fn convert(&self, value: &Value, dest: &ValueType, cx: &mut ConvertContext<'_>) -> Result<Value, String> {
            match (value, dest) {
                (Value::Object(id), ValueType::Int) => {
                    cx.graph().get::<Thickness>(*id).map(|t| Value::Int(t.0)).ok_or("not a thickness".into())
                }
                (Value::Int(n), _) => cx.create(&TypeKey::new(NS, "Thickness"), Thickness(*n)),
                (Value::String(s), _) => {
                    let n = s.parse::<i32>().map_err(|e| e.to_string())?;
                    cx.create(&TypeKey::new(NS, "Thickness"), Thickness(n))
                }
                _ => Err("unexpected input".into()),
            }
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::empty();
        registry.register(
            TypeDescriptor::builder::<Thickness>(NS, "Thickness")
                .converter(ThicknessConverter)
                .build()
                .unwrap(),
        );
        registry
    }

    fn thickness() -> ValueType {
        ValueType::Object(TypeKey::new(NS, "Thickness"))
    }

    #[rstest]
    #[case("true", ValueType::Bool, Value::Bool(true))]
    #[case("FALSE", ValueType::Bool, Value::Bool(false))]
    #[case("42", ValueType::Int, Value::Int(42))]
    #[case("-7", ValueType::NullableInt, Value::Int(-7))]
    #[case("", ValueType::NullableInt, Value::Null)]
    #[case("", ValueType::NullableChar, Value::Null)]
    #[case("x", ValueType::Char, Value::Char('x'))]
    #[case("2.5", ValueType::Double, Value::Double(2.5))]
    #[case("0.5", ValueType::Float, Value::Float(0.5))]
    #[case("text", ValueType::Any, Value::from("text"))]
    #[case("text", ValueType::String, Value::from("text"))]
    fn literal_conversions(#[case] text: &str, #[case] dest: ValueType, #[case] expected: Value) {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let out = ConversionPipeline::new(&registry).convert(Value::from(text), &dest, &mut graph).unwrap();
        assert_eq!(out, expected);
    }

    #[rstest]
    #[case("yes", ValueType::Bool)]
    #[case("4x", ValueType::Int)]
    #[case("ab", ValueType::Char)]
    #[case("", ValueType::Char)]
    fn malformed_literals_fail(#[case] text: &str, #[case] dest: ValueType) {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let err = ConversionPipeline::new(&registry).convert(Value::from(text), &dest, &mut graph).unwrap_err();
        assert!(matches!(err, CompileError::InvalidLiteral { .. }), "{err}");
    }

    #[test]
    fn enum_members_match_exactly() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let pipeline = ConversionPipeline::new(&registry);
        let orientation = ValueType::Enum(EnumDescriptor::new("Orientation", ["Horizontal", "Vertical"]));

        let ok = pipeline.convert(Value::from("Vertical"), &orientation, &mut graph).unwrap();
        assert_eq!(ok.as_enum().map(|e| e.member.as_str()), Some("Vertical"));

        let err = pipeline.convert(Value::from("Diagonal"), &orientation, &mut graph).unwrap_err();
        assert_eq!(err.to_string(), "`Diagonal` is not a member of enumeration `Orientation`");
    }

    #[test]
    fn null_is_accepted_only_where_nullable() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let pipeline = ConversionPipeline::new(&registry);
        assert_eq!(pipeline.convert(Value::Null, &ValueType::String, &mut graph).unwrap(), Value::Null);
        assert_eq!(pipeline.convert(Value::Null, &thickness(), &mut graph).unwrap(), Value::Null);
        let err = pipeline.convert(Value::Null, &ValueType::Int, &mut graph).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn destination_converter_builds_objects() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let out = ConversionPipeline::new(&registry).convert(Value::from("4"), &thickness(), &mut graph).unwrap();
        let id = out.as_object().unwrap();
        assert_eq!(graph.get::<Thickness>(id), Some(&Thickness(4)));
    }

    #[test]
    fn source_converter_unwraps_objects() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let descriptor = registry.describe(&TypeKey::new(NS, "Thickness")).unwrap();
        let id = graph.insert_object(Arc::clone(&descriptor), Thickness(9));
        let out = ConversionPipeline::new(&registry).convert(Value::Object(id), &ValueType::Int, &mut graph).unwrap();
        assert_eq!(out, Value::Int(9));
    }

    #[test]
    fn converter_failures_name_the_owner() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let err = ConversionPipeline::new(&registry).convert(Value::from("wide"), &thickness(), &mut graph).unwrap_err();
        assert!(matches!(err, CompileError::ConverterFailed { ref owner, .. } if owner == "Thickness"));
    }

    #[test]
    fn conversion_is_deterministic() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let pipeline = ConversionPipeline::new(&registry);
        for (value, dest) in [
            (Value::from("12"), ValueType::Int),
            (Value::from("maybe"), ValueType::Bool),
            (Value::Bool(true), ValueType::Char),
        ] {
            let a = pipeline.convert(value.clone(), &dest, &mut graph);
            let b = pipeline.convert(value, &dest, &mut graph);
            match (a, b) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => assert_eq!(a.kind(), b.kind()),
                (a, b) => panic!("diverged: {a:?} vs {b:?}"),
            }
        }
    }

    #[test]
    fn unsupported_names_both_types() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let err = ConversionPipeline::new(&registry).convert(Value::Bool(true), &ValueType::Char, &mut graph).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert true (Bool) to Char");
    }
}
