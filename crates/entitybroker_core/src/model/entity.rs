//! Entity contract and static field metadata.
//!
//! # Responsibility
//! - Describe each persisted entity once, as `'static` data, so the type map
//!   can be built without per-call introspection.
//! - Give the materializer a uniform way to fill a fresh entity.
//!
//! # Invariants
//! - The key field is not listed in `fields`; it always maps to `GUID`.
//! - `set_field` and `field_value` accept exactly the names in `fields`.

use super::key::Key;
use super::value::{Value, ValueError};

/// Declared kind of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Key,
    DateTime,
    NullableDateTime,
    Bool,
    Int16,
    Int32,
    Int64,
    Double,
    Float,
    Decimal,
    Xml,
    Enum { table: &'static str },
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Key => "key",
            Self::DateTime => "datetime",
            Self::NullableDateTime => "nullable datetime",
            Self::Bool => "bool",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Double => "double",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Xml => "xml",
            Self::Enum { .. } => "enum",
        }
    }

    /// Whether `value` may be bound against a column of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Key, Value::Key(_)) => true,
            (Self::DateTime | Self::NullableDateTime, Value::DateTime(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Int16, Value::Int16(_)) => true,
            (Self::Int32, Value::Int16(_) | Value::Int32(_)) => true,
            (Self::Int64, Value::Int16(_) | Value::Int32(_) | Value::Int64(_)) => true,
            (
                Self::Double,
                Value::Double(_) | Value::Float(_) | Value::Int16(_) | Value::Int32(_),
            ) => true,
            (Self::Float, Value::Float(_) | Value::Int16(_)) => true,
            (
                Self::Decimal,
                Value::Decimal(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_),
            ) => true,
            (Self::Xml, Value::Xml(_) | Value::Text(_)) => true,
            (Self::Enum { table }, Value::Enum(code)) => code.table() == *table,
            _ => false,
        }
    }
}

/// One persisted field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Physical column override; `None` applies the naming rules.
    pub column: Option<&'static str>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            column: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn key(name: &'static str) -> Self {
        Self::new(name, FieldKind::Key)
    }

    pub const fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub const fn nullable_datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::NullableDateTime)
    }

    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub const fn int16(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int16)
    }

    pub const fn int32(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int32)
    }

    pub const fn int64(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int64)
    }

    pub const fn double(name: &'static str) -> Self {
        Self::new(name, FieldKind::Double)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub const fn decimal(name: &'static str) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    pub const fn xml(name: &'static str) -> Self {
        Self::new(name, FieldKind::Xml)
    }

    pub const fn enumeration(name: &'static str, table: &'static str) -> Self {
        Self::new(name, FieldKind::Enum { table })
    }

    pub const fn with_column(self, column: &'static str) -> Self {
        Self {
            column: Some(column),
            ..self
        }
    }
}

/// Static description of one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Logical entity name; also the table name.
    pub name: &'static str,
    /// Logical name of the key field, stored in the `GUID` column.
    pub key_field: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl EntityDescriptor {
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            name,
            key_field: "Key",
            fields,
        }
    }

    pub const fn with_key_field(self, key_field: &'static str) -> Self {
        Self { key_field, ..self }
    }
}

/// A persisted record type the broker can load and store.
pub trait Entity: Default {
    fn descriptor() -> &'static EntityDescriptor;

    fn key(&self) -> Option<&Key>;

    fn set_key(&mut self, key: Key);

    /// Assigns one materialized column value.
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), ValueError>;

    /// Current value of one field, or `None` for an unknown name.
    fn field_value(&self, field: &str) -> Option<Value>;
}
