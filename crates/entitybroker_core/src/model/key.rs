//! Opaque entity keys.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Row identifier of one entity, tagged with the logical entity name.
///
/// Equality and hashing use the raw identifier only, so a key read back from
/// a foreign-key column equals the key of the row it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    entity: String,
    raw: Uuid,
}

impl Key {
    pub fn new(entity: impl Into<String>, raw: Uuid) -> Self {
        Self {
            entity: entity.into(),
            raw,
        }
    }

    /// Creates a fresh random key for a row about to be inserted.
    pub fn generate(entity: impl Into<String>) -> Self {
        Self::new(entity, Uuid::new_v4())
    }

    pub fn raw(&self) -> Uuid {
        self.raw
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
