//! Arena of constructed instances and the identifier registry.
//!
//! Instances never move once inserted; [`ObjectId`] is a plain index and
//! references between objects are ids, not pointers.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CompileError;
use crate::registry::TypeDescriptor;
use crate::value::{ObjectId, Value};

// ── ObjectGraph ───────────────────────────────────────────────────────────

struct Slot {
    descriptor: Arc<TypeDescriptor>,
    instance: Box<dyn Any>,
}

/// Owns every instance a compilation creates, in creation order.
#[derive(Default)]
pub struct ObjectGraph {
    slots: Vec<Slot>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, descriptor: Arc<TypeDescriptor>, instance: Box<dyn Any>) -> ObjectId {
        let id = ObjectId(self.slots.len());
        log::trace!("graph: {} <- {}", id, descriptor.key());
        self.slots.push(Slot { descriptor, instance });
        id
    }

    /// Store a typed instance. Converters use this to hand back objects they build.
    pub fn insert_object<T: Any>(&mut self, descriptor: Arc<TypeDescriptor>, instance: T) -> ObjectId {
        self.insert(descriptor, Box::new(instance))
    }

    pub fn descriptor(&self, id: ObjectId) -> Option<&Arc<TypeDescriptor>> {
        self.slots.get(id.0).map(|slot| &slot.descriptor)
    }

    pub fn get<T: Any>(&self, id: ObjectId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.instance.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.instance.downcast_mut::<T>())
    }

    pub fn instance(&self, id: ObjectId) -> Option<&dyn Any> {
        self.slots.get(id.0).map(|slot| &*slot.instance)
    }

    pub(crate) fn instance_mut(&mut self, id: ObjectId) -> Option<&mut dyn Any> {
        self.slots.get_mut(id.0).map(|slot| &mut *slot.instance)
    }

    /// Read a property through its registered getter.
    pub fn property(&self, id: ObjectId, name: &str) -> Option<Value> {
        let slot = self.slots.get(id.0)?;
        slot.descriptor.property(name)?.get(&*slot.instance)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.slots.len()).map(ObjectId)
    }
}

impl fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| slot.descriptor.key()))
            .finish()
    }
}

// ── ObjectRegistry ────────────────────────────────────────────────────────

/// Append-only map from declared identifier to value.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    entries: HashMap<String, Value>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, id: &str, value: Value) -> Result<(), CompileError> {
        if self.entries.contains_key(id) {
            return Err(CompileError::DuplicateIdentifier { id: id.to_string() });
        }
        log::debug!("registered identifier `{}` = {:?}", id, value);
        self.entries.insert(id.to_string(), value);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
