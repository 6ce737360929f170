//! Broker failure type.

use crate::db::DbError;
use crate::mapping::MappingError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BrokerResult<T> = Result<T, BrokerError>;

/// Single failure type surfaced at the broker boundary.
#[derive(Debug)]
pub enum BrokerError {
    Mapping(MappingError),
    UnsupportedType {
        entity: String,
        name: String,
        type_name: &'static str,
    },
    Execution {
        entity: String,
        sql: String,
        source: rusqlite::Error,
    },
    InvariantViolation {
        entity: String,
        message: String,
    },
    InvalidData {
        entity: String,
        message: String,
    },
    Db(DbError),
}

impl BrokerError {
    pub(crate) fn invariant(entity: &str, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_data(entity: &str, message: impl Into<String>) -> Self {
        Self::InvalidData {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(entity: &str, name: &str, type_name: &'static str) -> Self {
        Self::UnsupportedType {
            entity: entity.to_string(),
            name: name.to_string(),
            type_name,
        }
    }

    /// Entity the failure was raised for, when known.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::Mapping(err) => Some(&err.entity),
            Self::UnsupportedType { entity, .. }
            | Self::Execution { entity, .. }
            | Self::InvariantViolation { entity, .. }
            | Self::InvalidData { entity, .. } => Some(entity),
            Self::Db(_) => None,
        }
    }

    /// Generated SQL of a failed statement.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Whether the statement was interrupted by the statement timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Execution { source, .. } => {
                source.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
            }
            _ => false,
        }
    }
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mapping(err) => write!(f, "{err}"),
            Self::UnsupportedType {
                entity,
                name,
                type_name,
            } => write!(f, "unsupported type `{type_name}` for `{entity}.{name}`"),
            Self::Execution {
                entity,
                sql,
                source,
            } => write!(f, "statement on `{entity}` failed: {source}; sql: {sql}"),
            Self::InvariantViolation { entity, message } => {
                write!(f, "invalid request on `{entity}`: {message}")
            }
            Self::InvalidData { entity, message } => {
                write!(f, "invalid persisted `{entity}` data: {message}")
            }
            Self::Db(err) => write!(f, "connection failure: {err}"),
        }
    }
}

impl Error for BrokerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mapping(err) => Some(err),
            Self::Execution { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::UnsupportedType { .. }
            | Self::InvariantViolation { .. }
            | Self::InvalidData { .. } => None,
        }
    }
}

impl From<MappingError> for BrokerError {
    fn from(value: MappingError) -> Self {
        Self::Mapping(value)
    }
}

impl From<DbError> for BrokerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
