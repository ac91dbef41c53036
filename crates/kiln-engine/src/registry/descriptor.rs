use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::convert::Converter;
use crate::error::CompileError;
use crate::extension::{ExtensionArgs, MarkupExtension};
use crate::registry::TypeKey;
use crate::value::{Value, ValueType};

/// Property that receives element content when no property tag names one.
pub const DEFAULT_CONTENT_PROPERTY: &str = "Content";

/// Property consulted for the inherited data context.
pub const DEFAULT_DATA_CONTEXT_PROPERTY: &str = "DataContext";

// ── Erased accessors ──────────────────────────────────────────────────────
//
// Every accessor returns `None` when handed an instance of another type.

pub type Constructor = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;
pub type Getter = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> Option<()> + Send + Sync>;
pub type Inserter = Arc<dyn Fn(&mut dyn Any, Value, Value) -> Option<()> + Send + Sync>;
pub type ValueFactory = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
pub type ExtensionFactory =
    Arc<dyn Fn(ExtensionArgs) -> Result<Box<dyn MarkupExtension>, String> + Send + Sync>;

// ── PropertyKind ──────────────────────────────────────────────────────────

/// How values are assigned to a property. Fixed at registration.
#[derive(Clone)]
pub enum PropertyKind {
    /// Set, converting to `ty`.
    Scalar { ty: ValueType, set: Setter },
    /// Append, converting to `element`. Document order is preserved.
    Collection { element: ValueType, push: Setter },
    /// Append as is.
    List { push: Setter },
    /// Insert under the element's declared key, converting key and value.
    Map { key: ValueType, value: ValueType, insert: Inserter },
}

impl PropertyKind {
    pub fn shape(&self) -> &'static str {
        match self {
            PropertyKind::Scalar { .. } => "scalar",
            PropertyKind::Collection { .. } => "collection",
            PropertyKind::List { .. } => "list",
            PropertyKind::Map { .. } => "map",
        }
    }
}

// ── PropertyDescriptor ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropertyKind,
    getter: Option<Getter>,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Read the property, if it has a getter and `instance` has the right type.
    pub fn get(&self, instance: &dyn Any) -> Option<Value> {
        self.getter.as_ref().and_then(|get| get(instance))
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("shape", &self.kind.shape())
            .field("readable", &self.getter.is_some())
            .finish()
    }
}

// ── ExtensionDescriptor ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct ExtensionDescriptor {
    name: String,
    factory: ExtensionFactory,
}

impl ExtensionDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self, args: ExtensionArgs) -> Result<Box<dyn MarkupExtension>, String> {
        (self.factory)(args)
    }
}

// ── TypeDescriptor ────────────────────────────────────────────────────────

/// Everything the compiler knows about one markup-visible type.
pub struct TypeDescriptor {
    key: TypeKey,
    constructor: Option<Constructor>,
    properties: HashMap<String, PropertyDescriptor>,
    assignable_to: Vec<TypeKey>,
    content_property: Option<String>,
    data_context_property: Option<String>,
    converter: Option<Arc<dyn Converter>>,
    extension: Option<ExtensionDescriptor>,
    value_factory: Option<ValueFactory>,
}

impl TypeDescriptor {
    /// Start describing the Rust type `T` as `namespace`/`name`.
    pub fn builder<T: Any>(namespace: impl Into<String>, name: impl Into<String>) -> TypeBuilder<T> {
        TypeBuilder::new(TypeKey::new(namespace, name))
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }

    /// True for the type itself and every type it declared itself assignable to.
    pub fn is_assignable_to(&self, key: &TypeKey) -> bool {
        &self.key == key || self.assignable_to.contains(key)
    }

    pub fn content_property(&self) -> &str {
        self.content_property.as_deref().unwrap_or(DEFAULT_CONTENT_PROPERTY)
    }

    pub fn data_context_property(&self) -> &str {
        self.data_context_property.as_deref().unwrap_or(DEFAULT_DATA_CONTEXT_PROPERTY)
    }

    pub fn converter(&self) -> Option<&dyn Converter> {
        self.converter.as_deref()
    }

    pub fn extension(&self) -> Option<&ExtensionDescriptor> {
        self.extension.as_ref()
    }

    pub fn extension_name(&self) -> Option<&str> {
        self.extension.as_ref().map(ExtensionDescriptor::name)
    }

    pub fn is_value_factory(&self) -> bool {
        self.value_factory.is_some()
    }

    pub(crate) fn instantiate(&self) -> Option<Box<dyn Any>> {
        self.constructor.as_ref().map(|construct| construct())
    }

    /// The product a value-factory instance stands for. `None` when this type
    /// is not a value factory or `instance` is not one of ours.
    pub(crate) fn produce(&self, instance: &dyn Any) -> Option<Value> {
        self.value_factory.as_ref().and_then(|produce| produce(instance))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("properties", &self.properties.len())
            .field("extension", &self.extension_name())
            .finish()
    }
}

// ── TypeBuilder ───────────────────────────────────────────────────────────

/// Builds a [`TypeDescriptor`] from typed closures over `T`.
///
/// ```rust,ignore
/// let label = TypeDescriptor::builder::<Label>(APP, "Label")
///     .default_constructor()
///     .scalar_rw("Text", ValueType::Any, |l: &Label| l.text.clone(), |l, v| l.text = v)
///     .content_property("Text")
///     .build()?;
/// ```
pub struct TypeBuilder<T> {
    key: TypeKey,
    constructor: Option<Constructor>,
    properties: HashMap<String, PropertyDescriptor>,
    assignable_to: Vec<TypeKey>,
    content_property: Vec<String>,
    data_context_property: Vec<String>,
    converter: Vec<Arc<dyn Converter>>,
    extension: Vec<ExtensionDescriptor>,
    value_factory: Option<ValueFactory>,
    duplicate_property: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> TypeBuilder<T> {
    fn new(key: TypeKey) -> Self {
        Self {
            key,
            constructor: None,
            properties: HashMap::new(),
            assignable_to: Vec::new(),
            content_property: Vec::new(),
            data_context_property: Vec::new(),
            converter: Vec::new(),
            extension: Vec::new(),
            value_factory: None,
            duplicate_property: None,
            _marker: PhantomData,
        }
    }

    pub fn constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move || Box::new(construct()) as Box<dyn Any>));
        self
    }

    // ── Properties ────────────────────────────────────────────────────────

    pub fn scalar<S>(self, name: impl Into<String>, ty: ValueType, set: S) -> Self
    where
        S: Fn(&mut T, Value) + Send + Sync + 'static,
    {
        self.add(name.into(), PropertyKind::Scalar { ty, set: erase_setter(set) }, None)
    }

    /// A scalar property that can also be read back (data-context lookups, `DataContext Path=`).
    pub fn scalar_rw<G, S>(self, name: impl Into<String>, ty: ValueType, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |any: &dyn Any| any.downcast_ref::<T>().map(&get));
        self.add(name.into(), PropertyKind::Scalar { ty, set: erase_setter(set) }, Some(getter))
    }

    pub fn collection<S>(self, name: impl Into<String>, element: ValueType, push: S) -> Self
    where
        S: Fn(&mut T, Value) + Send + Sync + 'static,
    {
        self.add(name.into(), PropertyKind::Collection { element, push: erase_setter(push) }, None)
    }

    pub fn list<S>(self, name: impl Into<String>, push: S) -> Self
    where
        S: Fn(&mut T, Value) + Send + Sync + 'static,
    {
        self.add(name.into(), PropertyKind::List { push: erase_setter(push) }, None)
    }

    pub fn map<I>(self, name: impl Into<String>, key: ValueType, value: ValueType, insert: I) -> Self
    where
        I: Fn(&mut T, Value, Value) + Send + Sync + 'static,
    {
        let insert: Inserter = Arc::new(move |any: &mut dyn Any, k: Value, v: Value| {
            any.downcast_mut::<T>().map(|t| insert(t, k, v))
        });
        self.add(name.into(), PropertyKind::Map { key, value, insert }, None)
    }

    fn add(mut self, name: String, kind: PropertyKind, getter: Option<Getter>) -> Self {
        if self.properties.contains_key(&name) {
            self.duplicate_property.get_or_insert_with(|| name.clone());
        }
        self.properties.insert(name.clone(), PropertyDescriptor { name, kind, getter });
        self
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    /// Instances may be assigned wherever `key` is expected.
    pub fn assignable_to(mut self, key: TypeKey) -> Self {
        self.assignable_to.push(key);
        self
    }

    pub fn content_property(mut self, name: impl Into<String>) -> Self {
        self.content_property.push(name.into());
        self
    }

    pub fn data_context_property(mut self, name: impl Into<String>) -> Self {
        self.data_context_property.push(name.into());
        self
    }

    pub fn converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter.push(Arc::new(converter));
        self
    }

    /// Make this type a markup extension usable as `{name ...}`.
    pub fn extension<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(ExtensionArgs) -> Result<Box<dyn MarkupExtension>, String> + Send + Sync + 'static,
    {
        self.extension.push(ExtensionDescriptor { name: name.into(), factory: Arc::new(factory) });
        self
    }

    /// Instances stand for the value `produce` returns, not for themselves.
    pub fn value_factory<P>(mut self, produce: P) -> Self
    where
        P: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.value_factory =
            Some(Arc::new(move |any: &dyn Any| any.downcast_ref::<T>().map(&produce)));
        self
    }

    /// Validate and finish the descriptor.
    pub fn build(self) -> Result<TypeDescriptor, CompileError> {
        let ambiguous = |metadata: &str| CompileError::AmbiguousMetadata {
            owner: self.key.name.clone(),
            metadata: metadata.to_string(),
        };
        if self.content_property.len() > 1 {
            return Err(ambiguous("content property"));
        }
        if self.data_context_property.len() > 1 {
            return Err(ambiguous("data-context property"));
        }
        if self.converter.len() > 1 {
            return Err(ambiguous("converter"));
        }
        if self.extension.len() > 1 {
            return Err(ambiguous("extension name"));
        }
        if let Some(property) = &self.duplicate_property {
            return Err(ambiguous(&format!("property `{}`", property)));
        }
        Ok(self.assemble())
    }

    /// Finish without validation; only for descriptors declaring each metadata once.
    pub(crate) fn assemble(self) -> TypeDescriptor {
        TypeDescriptor {
            key: self.key,
            constructor: self.constructor,
            properties: self.properties,
            assignable_to: self.assignable_to,
            content_property: self.content_property.into_iter().next(),
            data_context_property: self.data_context_property.into_iter().next(),
            converter: self.converter.into_iter().next(),
            extension: self.extension.into_iter().next(),
            value_factory: self.value_factory,
        }
    }
}

impl<T: Any + Default> TypeBuilder<T> {
    pub fn default_constructor(self) -> Self {
        self.constructor(T::default)
    }
}

fn erase_setter<T: Any, S>(set: S) -> Setter
where
    S: Fn(&mut T, Value) + Send + Sync + 'static,
{
    Arc::new(move |any: &mut dyn Any, value: Value| any.downcast_mut::<T>().map(|t| set(t, value)))
}
