//! Connection acquisition for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections and apply connection setup.
//! - Retry transient open failures with linear backoff.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`, the configured busy
//!   timeout and the `xml_value` function registered.
//! - Only `SQLITE_BUSY`, `SQLITE_LOCKED` and `SQLITE_CANTOPEN` are retried.

use super::xml_function::register_xml_functions;
use super::{DbError, DbResult};
use crate::config::BrokerSettings;
use log::{error, info, warn};
use rusqlite::{Connection, ErrorCode};
use std::path::PathBuf;
use std::time::Instant;

/// Source of ready-to-use connections.
pub trait ConnectionProvider {
    fn acquire(&self) -> DbResult<Connection>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    File(PathBuf),
    /// Every acquire opens a fresh, private in-memory database.
    Memory,
}

impl DbTarget {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    target: DbTarget,
    settings: BrokerSettings,
}

impl SqliteConnectionProvider {
    pub fn new(target: DbTarget, settings: BrokerSettings) -> Self {
        Self { target, settings }
    }

    pub fn file(path: impl Into<PathBuf>, settings: BrokerSettings) -> Self {
        Self::new(DbTarget::File(path.into()), settings)
    }

    pub fn in_memory(settings: BrokerSettings) -> Self {
        Self::new(DbTarget::Memory, settings)
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    fn open_once(&self) -> rusqlite::Result<Connection> {
        let conn = match &self.target {
            DbTarget::File(path) => Connection::open(path)?,
            DbTarget::Memory => Connection::open_in_memory()?,
        };
        bootstrap_connection(&conn, &self.settings)?;
        Ok(conn)
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    /// Opens a connection, retrying transient failures up to
    /// `connect_retries` times.
    ///
    /// # Side effects
    /// - Emits `db_open` logging events with attempt count and duration.
    fn acquire(&self) -> DbResult<Connection> {
        let started_at = Instant::now();
        let mode = self.target.mode();
        info!("event=db_open module=db status=start mode={mode}");

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.open_once() {
                Ok(conn) => {
                    info!(
                        "event=db_open module=db status=ok mode={mode} attempts={attempt} duration_ms={}",
                        started_at.elapsed().as_millis()
                    );
                    return Ok(conn);
                }
                Err(err) if is_transient(&err) && attempt <= self.settings.connect_retries => {
                    let backoff = self.settings.retry_backoff() * attempt;
                    warn!(
                        "event=db_open module=db status=retry mode={mode} attempt={attempt} backoff_ms={} error={}",
                        backoff.as_millis(),
                        err
                    );
                    std::thread::sleep(backoff);
                }
                Err(err) => {
                    error!(
                        "event=db_open module=db status=error mode={mode} attempts={attempt} duration_ms={} error_code=db_open_failed error={}",
                        started_at.elapsed().as_millis(),
                        err
                    );
                    return Err(if attempt > 1 {
                        DbError::RetriesExhausted {
                            attempts: attempt,
                            source: err,
                        }
                    } else {
                        DbError::Sqlite(err)
                    });
                }
            }
        }
    }
}

fn bootstrap_connection(conn: &Connection, settings: &BrokerSettings) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(settings.busy_timeout())?;
    register_xml_functions(conn)?;
    Ok(())
}

fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen)
    )
}
