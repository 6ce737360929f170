//! SQLite collaborators of the broker.
//!
//! # Responsibility
//! - Acquire configured SQLite connections, retrying transient failures.
//! - Carry the connection or transaction a broker call executes against.
//!
//! # Invariants
//! - Acquired connections have `foreign_keys=ON`, a busy timeout and the
//!   `xml_value` function registered.
//! - Statement execution is never retried here; only connection
//!   establishment is.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod context;
mod provider;
mod xml_function;

pub use context::{PersistenceContext, UpdateContext};
pub use provider::{ConnectionProvider, DbTarget, SqliteConnectionProvider};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    RetriesExhausted {
        attempts: u32,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::RetriesExhausted { attempts, source } => {
                write!(f, "giving up after {attempts} attempts: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::RetriesExhausted { source, .. } => Some(source),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
