//! Execution contexts handed to brokers.

use super::DbResult;
use crate::config::BrokerSettings;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Duration;

/// Connection (or open transaction) plus the settings every statement of a
/// broker call runs with.
#[derive(Debug)]
pub struct PersistenceContext<'conn> {
    conn: &'conn Connection,
    transactional: bool,
    settings: BrokerSettings,
}

impl<'conn> PersistenceContext<'conn> {
    /// Autocommit context over a plain connection.
    pub fn read(conn: &'conn Connection, settings: &BrokerSettings) -> Self {
        Self {
            conn,
            transactional: false,
            settings: settings.clone(),
        }
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub fn in_transaction(&self) -> bool {
        self.transactional
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.settings.statement_timeout()
    }
}

/// Write transaction; dropped without `commit` it rolls back.
#[derive(Debug)]
pub struct UpdateContext<'conn> {
    tx: Transaction<'conn>,
    settings: BrokerSettings,
}

impl<'conn> UpdateContext<'conn> {
    /// Begins an immediate transaction so the write lock is taken up front.
    pub fn begin(conn: &'conn mut Connection, settings: &BrokerSettings) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self {
            tx,
            settings: settings.clone(),
        })
    }

    /// Transactional context for brokers taking part in this transaction.
    pub fn context(&self) -> PersistenceContext<'_> {
        PersistenceContext {
            conn: &self.tx,
            transactional: true,
            settings: self.settings.clone(),
        }
    }

    pub fn commit(self) -> DbResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> DbResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}
