//! Criteria trees and update column sets.
//!
//! # Responsibility
//! - Let callers express WHERE predicates, sort order and correlated
//!   sub-queries as data, per entity.
//! - Keep children in insertion order so compilation is deterministic.
//!
//! # Invariants
//! - Child keys are unique inside a group; inserting an existing key
//!   replaces that child in place.
//!
//! # See also
//! - `crate::sql::compiler` for the SQL each node compiles to.

mod condition;
mod update;

pub use condition::{
    RelatedEntityCondition, RelatedTest, SearchCondition, SearchTest, SortDirection, SortOrder,
    XmlPathCondition, XmlTest,
};
pub use update::UpdateColumns;

use crate::model::{Entity, EntityDescriptor};
use indexmap::IndexMap;

/// One node of a criteria tree.
#[derive(Debug, Clone)]
pub enum Criteria {
    Condition(SearchCondition),
    XmlPath(XmlPathCondition),
    Related(RelatedEntityCondition),
    Group(CriteriaGroup),
}

impl From<SearchCondition> for Criteria {
    fn from(value: SearchCondition) -> Self {
        Self::Condition(value)
    }
}

impl From<XmlPathCondition> for Criteria {
    fn from(value: XmlPathCondition) -> Self {
        Self::XmlPath(value)
    }
}

impl From<RelatedEntityCondition> for Criteria {
    fn from(value: RelatedEntityCondition) -> Self {
        Self::Related(value)
    }
}

impl From<CriteriaGroup> for Criteria {
    fn from(value: CriteriaGroup) -> Self {
        Self::Group(value)
    }
}

/// Named children ANDed together.
///
/// The key of a leaf is the field it tests; the key of a nested group only
/// labels it.
#[derive(Debug, Clone, Default)]
pub struct CriteriaGroup {
    children: IndexMap<String, Criteria>,
}

impl CriteriaGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, child: impl Into<Criteria>) -> Self {
        self.insert(key, child);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, child: impl Into<Criteria>) -> &mut Self {
        self.children.insert(key.into(), child.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Criteria> {
        self.children.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Criteria> {
        self.children.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criteria)> {
        self.children.iter().map(|(key, child)| (key.as_str(), child))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Root of a criteria tree for one entity.
#[derive(Debug, Clone)]
pub struct SelectCriteria {
    descriptor: &'static EntityDescriptor,
    root: CriteriaGroup,
}

impl SelectCriteria {
    pub fn new<E: Entity>() -> Self {
        Self::for_descriptor(E::descriptor())
    }

    pub fn for_descriptor(descriptor: &'static EntityDescriptor) -> Self {
        Self {
            descriptor,
            root: CriteriaGroup::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, child: impl Into<Criteria>) -> Self {
        self.root.insert(key, child);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, child: impl Into<Criteria>) -> &mut Self {
        self.root.insert(key, child);
        self
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    pub fn entity_name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn root(&self) -> &CriteriaGroup {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
