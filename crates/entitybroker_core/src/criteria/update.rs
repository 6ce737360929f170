//! Partial column sets for INSERT and UPDATE.

use crate::model::{Entity, EntityDescriptor, Value};
use indexmap::IndexMap;

/// Field name to new value, in insertion order.
#[derive(Debug, Clone)]
pub struct UpdateColumns {
    descriptor: &'static EntityDescriptor,
    columns: IndexMap<String, Value>,
}

impl UpdateColumns {
    pub fn new<E: Entity>() -> Self {
        Self::for_descriptor(E::descriptor())
    }

    pub fn for_descriptor(descriptor: &'static EntityDescriptor) -> Self {
        Self {
            descriptor,
            columns: IndexMap::new(),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.columns.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    pub fn entity_name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
