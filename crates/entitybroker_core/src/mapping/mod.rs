//! Field-to-column mapping.
//!
//! # Responsibility
//! - Apply the physical naming rules to logical field names.
//! - Own the process-wide type map cache.
//!
//! # See also
//! - `type_map` for the cache contract.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod naming;
pub mod type_map;

pub use type_map::{register, resolve, ColumnMapping, ResolvedColumn, TypeMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingErrorKind {
    /// Criteria or update names a field the entity does not declare.
    UnknownField,
    /// A result column has no declared field.
    UnmappedColumn,
    InvalidIdentifier,
    DuplicateField,
    DuplicateColumn,
    ReservedColumn,
    /// A different descriptor was already registered under the same name.
    ConflictingDescriptor,
}

impl MappingErrorKind {
    fn describe(self) -> &'static str {
        match self {
            Self::UnknownField => "unknown field",
            Self::UnmappedColumn => "result column has no mapped field",
            Self::InvalidIdentifier => "invalid identifier",
            Self::DuplicateField => "duplicate field",
            Self::DuplicateColumn => "duplicate column",
            Self::ReservedColumn => "reserved column name",
            Self::ConflictingDescriptor => "conflicting descriptor registration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingError {
    pub entity: String,
    pub name: String,
    pub kind: MappingErrorKind,
}

impl MappingError {
    pub fn new(entity: impl Into<String>, name: impl Into<String>, kind: MappingErrorKind) -> Self {
        Self {
            entity: entity.into(),
            name: name.into(),
            kind,
        }
    }
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mapping error on `{}`: {} `{}`",
            self.entity,
            self.kind.describe(),
            self.name
        )
    }
}

impl Error for MappingError {}
