//! Process-wide type map cache.
//!
//! # Responsibility
//! - Build the field-to-column table of an entity once from its descriptor.
//! - Serve the cached table to the compiler, builder and materializer.
//!
//! # Invariants
//! - Every declared field has exactly one column, and every column one field.
//! - A map, once cached, is never rebuilt or evicted for the process lifetime.
//! - Column lookup is ASCII case-insensitive, like SQLite identifiers.

use super::naming::{self, PRIMARY_KEY_COLUMN, ROW_NUMBER_COLUMN};
use super::{MappingError, MappingErrorKind};
use crate::model::{EntityDescriptor, FieldKind};
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

static TYPE_MAPS: Lazy<RwLock<HashMap<&'static str, Arc<TypeMap>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Mapping of one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    field: &'static str,
    column: String,
    kind: FieldKind,
}

impl ColumnMapping {
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Column a logical name resolves to, including the key aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn<'a> {
    pub field: &'a str,
    pub column: &'a str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct TypeMap {
    descriptor: &'static EntityDescriptor,
    fields: IndexMap<&'static str, ColumnMapping>,
    by_column: HashMap<String, &'static str>,
    key_aliases: Vec<String>,
}

impl TypeMap {
    /// Validates `descriptor` and computes its column table.
    pub fn build(descriptor: &'static EntityDescriptor) -> Result<Self, MappingError> {
        let entity = descriptor.name;
        let fail = |name: &str, kind| MappingError::new(entity, name, kind);

        for name in [descriptor.name, descriptor.key_field] {
            if !naming::is_valid_identifier(name) {
                return Err(fail(name, MappingErrorKind::InvalidIdentifier));
            }
        }

        let mut key_aliases = vec![descriptor.key_field.to_string()];
        for alias in ["Key".to_string(), format!("{entity}Key")] {
            if !key_aliases.contains(&alias) {
                key_aliases.push(alias);
            }
        }

        let mut fields = IndexMap::with_capacity(descriptor.fields.len());
        let mut by_column = HashMap::with_capacity(descriptor.fields.len());
        for field in descriptor.fields {
            if !naming::is_valid_identifier(field.name) {
                return Err(fail(field.name, MappingErrorKind::InvalidIdentifier));
            }
            if fields.contains_key(field.name) || key_aliases.iter().any(|a| a == field.name) {
                return Err(fail(field.name, MappingErrorKind::DuplicateField));
            }

            let column = match field.column {
                Some(column) => column.to_string(),
                None => naming::column_for_field(field.name, field.kind),
            };
            if !naming::is_valid_identifier(&column) {
                return Err(fail(&column, MappingErrorKind::InvalidIdentifier));
            }
            if column.eq_ignore_ascii_case(PRIMARY_KEY_COLUMN)
                || column.eq_ignore_ascii_case(ROW_NUMBER_COLUMN)
            {
                return Err(fail(&column, MappingErrorKind::ReservedColumn));
            }
            if by_column
                .insert(column.to_ascii_lowercase(), field.name)
                .is_some()
            {
                return Err(fail(&column, MappingErrorKind::DuplicateColumn));
            }

            fields.insert(
                field.name,
                ColumnMapping {
                    field: field.name,
                    column,
                    kind: field.kind,
                },
            );
        }

        Ok(Self {
            descriptor,
            fields,
            by_column,
            key_aliases,
        })
    }

    pub fn entity(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    /// Whether `name` designates the primary key (`key_field`, `Key` or `<Entity>Key`).
    pub fn is_key_field(&self, name: &str) -> bool {
        self.key_aliases.iter().any(|alias| alias == name)
    }

    pub fn field(&self, name: &str) -> Option<&ColumnMapping> {
        self.fields.get(name)
    }

    /// Resolves a logical name used by criteria, update columns or correlations.
    pub fn column(&self, name: &str) -> Option<ResolvedColumn<'_>> {
        if self.is_key_field(name) {
            return Some(ResolvedColumn {
                field: self.descriptor.key_field,
                column: PRIMARY_KEY_COLUMN,
                kind: FieldKind::Key,
            });
        }
        self.fields.get(name).map(|mapping| ResolvedColumn {
            field: mapping.field,
            column: &mapping.column,
            kind: mapping.kind,
        })
    }

    /// Reverse lookup used by the row materializer.
    pub fn field_for_column(&self, column: &str) -> Option<&ColumnMapping> {
        self.by_column
            .get(&column.to_ascii_lowercase())
            .and_then(|field| self.fields.get(field))
    }

    /// Declared fields in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Returns the cached map for `descriptor`, building it on first use.
///
/// # Errors
/// - Returns a mapping error when the descriptor is invalid.
/// - Returns `ConflictingDescriptor` when another descriptor already claimed
///   the same entity name.
pub fn resolve(descriptor: &'static EntityDescriptor) -> Result<Arc<TypeMap>, MappingError> {
    {
        let maps = TYPE_MAPS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = maps.get(descriptor.name) {
            return same_descriptor(map, descriptor);
        }
    }

    let mut maps = TYPE_MAPS.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(map) = maps.get(descriptor.name) {
        return same_descriptor(map, descriptor);
    }

    let map = Arc::new(TypeMap::build(descriptor)?);
    debug!(
        "event=type_map_built module=mapping status=ok entity={} fields={}",
        map.entity(),
        map.len()
    );
    maps.insert(descriptor.name, Arc::clone(&map));
    Ok(map)
}

/// Validates and caches `descriptor` ahead of first use.
pub fn register(descriptor: &'static EntityDescriptor) -> Result<(), MappingError> {
    resolve(descriptor).map(|_| ())
}

pub fn is_registered(entity: &str) -> bool {
    TYPE_MAPS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(entity)
}

fn same_descriptor(
    map: &Arc<TypeMap>,
    descriptor: &'static EntityDescriptor,
) -> Result<Arc<TypeMap>, MappingError> {
    if std::ptr::eq(map.descriptor, descriptor) || *map.descriptor == *descriptor {
        Ok(Arc::clone(map))
    } else {
        Err(MappingError::new(
            descriptor.name,
            descriptor.name,
            MappingErrorKind::ConflictingDescriptor,
        ))
    }
}
