use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::registry::TypeKey;

// ── ObjectId ──────────────────────────────────────────────────────────────

/// Non-owning handle to an instance stored in an [`ObjectGraph`](crate::graph::ObjectGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Enumerations ──────────────────────────────────────────────────────────

/// A named, closed set of members. Member names are matched case-sensitively.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    members: Vec<String>,
}

impl EnumDescriptor {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member named exactly `member`, if any.
    pub fn value(&self, member: &str) -> Option<EnumValue> {
        self.members.iter().any(|m| m == member).then(|| EnumValue {
            enumeration: self.name.clone(),
            member: member.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub enumeration: String,
    pub member: String,
}

// ── Value ─────────────────────────────────────────────────────────────────

/// A value flowing through evaluation, conversion and assignment.
///
/// Objects are referenced by [`ObjectId`]; the graph owns them.
#[derive(Clone)]
pub enum Value {
    Null,
    String(String),
    Bool(bool),
    Int(i32),
    Double(f64),
    Float(f32),
    Char(char),
    Enum(EnumValue),
    Object(ObjectId),
    /// Host data the compiler passes through untouched (data contexts, converter products).
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn downcast_opaque<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Float(x) => write!(f, "{}f", x),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Enum(e) => write!(f, "{}.{}", e.enumeration, e.member),
            Value::Object(id) => write!(f, "object {}", id),
            Value::Opaque(_) => write!(f, "opaque"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

// ── ValueType ─────────────────────────────────────────────────────────────

/// The static type a property declares. Conversion targets one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    /// Accepts every value as is.
    Any,
    String,
    Bool,
    Int,
    NullableInt,
    Double,
    Float,
    Char,
    NullableChar,
    Enum(Arc<EnumDescriptor>),
    /// Objects whose type is, or is assignable to, the given type.
    Object(TypeKey),
    Opaque,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "Any"),
            ValueType::String => write!(f, "String"),
            ValueType::Bool => write!(f, "Bool"),
            ValueType::Int => write!(f, "Int"),
            ValueType::NullableInt => write!(f, "Int?"),
            ValueType::Double => write!(f, "Double"),
            ValueType::Float => write!(f, "Float"),
            ValueType::Char => write!(f, "Char"),
            ValueType::NullableChar => write!(f, "Char?"),
            ValueType::Enum(e) => write!(f, "enum {}", e.name()),
            ValueType::Object(key) => write!(f, "{}", key),
            ValueType::Opaque => write!(f, "Opaque"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_members_are_case_sensitive() {
        let orientation = EnumDescriptor::new("Orientation", ["Horizontal", "Vertical"]);
        assert_eq!(
            orientation.value("Vertical"),
            Some(EnumValue { enumeration: "Orientation".into(), member: "Vertical".into() })
        );
        assert_eq!(orientation.value("vertical"), None);
    }

    #[test]
    fn opaque_equality_is_identity() {
        let a = Value::opaque(5_u8);
        let b = Value::opaque(5_u8);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_opaque::<u8>(), Some(&5));
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(Value::from("x").as_int(), None);
        assert_eq!(Value::from(3).as_int(), Some(3));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn value_type_display() {
        let key = TypeKey::new("urn:app", "Button");
        assert_eq!(ValueType::Object(key).to_string(), "{urn:app}Button");
        assert_eq!(ValueType::NullableInt.to_string(), "Int?");
    }
}
