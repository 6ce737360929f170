//! Tagged bindable values.
//!
//! # Responsibility
//! - Carry every value kind a criteria leaf, update column or result cell
//!   can hold.
//! - Convert values back into typed entity fields.
//!
//! # Invariants
//! - Widening conversions (`Int16` into `i32`, `Float` into `f64`) are
//!   allowed; narrowing conversions are rejected.

use super::enums::{EnumCode, PersistedEnum};
use super::key::Key;
use super::xml::XmlDocument;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Key(Key),
    DateTime(NaiveDateTime),
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Float(f32),
    Decimal(Decimal),
    Xml(XmlDocument),
    Enum(EnumCode),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stable kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Key(_) => "key",
            Self::DateTime(_) => "datetime",
            Self::Bool(_) => "bool",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Double(_) => "double",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Xml(_) => "xml",
            Self::Enum(_) => "enum",
        }
    }

    pub fn get<T: FromValue>(self) -> Result<T, ValueError> {
        T::from_value(self)
    }

    pub fn into_enum<E: PersistedEnum>(self) -> Result<E, ValueError> {
        match self {
            Self::Enum(code) => code.decode::<E>().ok_or(ValueError::UnknownEnumCode {
                table: E::LOOKUP_TABLE,
                code: code.code(),
            }),
            other => Err(ValueError::mismatch("enum", &other)),
        }
    }

    pub fn into_optional_enum<E: PersistedEnum>(self) -> Result<Option<E>, ValueError> {
        match self {
            Self::Null => Ok(None),
            other => other.into_enum().map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    UnknownEnumCode {
        table: &'static str,
        code: i16,
    },
    UnknownField(String),
}

impl ValueError {
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }
}

impl Display for ValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected} value, found {found}")
            }
            Self::UnknownEnumCode { table, code } => {
                write!(f, "code {code} is not defined in `{table}`")
            }
            Self::UnknownField(name) => write!(f, "no field named `{name}`"),
        }
    }
}

impl Error for ValueError {}

/// Typed extraction out of a `Value`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(ValueError::mismatch("text", &other)),
        }
    }
}

impl FromValue for Key {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Key(key) => Ok(key),
            other => Err(ValueError::mismatch("key", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::DateTime(at) => Ok(at),
            other => Err(ValueError::mismatch("datetime", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }
}

impl FromValue for i16 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int16(number) => Ok(number),
            other => Err(ValueError::mismatch("int16", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int16(number) => Ok(i32::from(number)),
            Value::Int32(number) => Ok(number),
            other => Err(ValueError::mismatch("int32", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int16(number) => Ok(i64::from(number)),
            Value::Int32(number) => Ok(i64::from(number)),
            Value::Int64(number) => Ok(number),
            other => Err(ValueError::mismatch("int64", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Double(number) => Ok(number),
            Value::Float(number) => Ok(f64::from(number)),
            other => Err(ValueError::mismatch("double", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(number) => Ok(number),
            other => Err(ValueError::mismatch("float", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Decimal(number) => Ok(number),
            other => Err(ValueError::mismatch("decimal", &other)),
        }
    }
}

impl FromValue for XmlDocument {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Xml(document) => Ok(document),
            other => Err(ValueError::mismatch("xml", &other)),
        }
    }
}

impl FromValue for EnumCode {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Enum(code) => Ok(code),
            other => Err(ValueError::mismatch("enum", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Key> for Value {
    fn from(value: Key) -> Self {
        Self::Key(value)
    }
}

impl From<&Key> for Value {
    fn from(value: &Key) -> Self {
        Self::Key(value.clone())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self::Int16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<XmlDocument> for Value {
    fn from(value: XmlDocument) -> Self {
        Self::Xml(value)
    }
}

impl From<EnumCode> for Value {
    fn from(value: EnumCode) -> Self {
        Self::Enum(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
