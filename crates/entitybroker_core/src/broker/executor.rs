//! Statement execution against a persistence context.

use super::error::{BrokerError, BrokerResult};
use crate::db::PersistenceContext;
use crate::logging::{log_statement, log_statement_failure};
use crate::sql::Statement;
use rusqlite::{Connection, Row};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// VM instructions between two statement-timeout checks.
const PROGRESS_STEPS: i32 = 1_000;

thread_local! {
    /// Statements currently running per connection, innermost last. `None`
    /// marks a statement without a timeout.
    static RUNNING: RefCell<HashMap<usize, Vec<Option<Arc<StatementClock>>>>> =
        RefCell::new(HashMap::new());
}

/// Execution time charged to one statement.
///
/// The clock only runs while SQLite executes the statement; it is paused
/// while a row is handed to the caller.
#[derive(Debug)]
struct StatementClock {
    limit: Duration,
    state: Mutex<ClockState>,
}

#[derive(Debug)]
struct ClockState {
    spent: Duration,
    resumed_at: Option<Instant>,
}

impl StatementClock {
    fn start(limit: Duration) -> Arc<Self> {
        Arc::new(Self {
            limit,
            state: Mutex::new(ClockState {
                spent: Duration::ZERO,
                resumed_at: Some(Instant::now()),
            }),
        })
    }

    fn pause(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(resumed_at) = state.resumed_at.take() {
            state.spent += resumed_at.elapsed();
        }
    }

    fn resume(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.resumed_at.is_none() {
            state.resumed_at = Some(Instant::now());
        }
    }

    fn expired(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let running = state
            .resumed_at
            .map_or(Duration::ZERO, |resumed_at| resumed_at.elapsed());
        state.spent + running > self.limit
    }
}

/// Interrupts the running statement once its clock exceeds the timeout.
///
/// Guards nest per connection: dropping an inner guard re-installs the
/// handler of the enclosing statement instead of clearing it.
struct TimeoutGuard<'c> {
    conn: &'c Connection,
    clock: Option<Arc<StatementClock>>,
}

impl<'c> TimeoutGuard<'c> {
    fn arm(conn: &'c Connection, timeout: Option<Duration>) -> Self {
        let clock = timeout.map(StatementClock::start);
        RUNNING.with(|running| {
            running
                .borrow_mut()
                .entry(connection_id(conn))
                .or_default()
                .push(clock.clone());
        });
        install_handler(conn, clock.as_ref());
        Self { conn, clock }
    }

    fn pause(&self) {
        if let Some(clock) = &self.clock {
            clock.pause();
        }
    }

    fn resume(&self) {
        if let Some(clock) = &self.clock {
            clock.resume();
        }
    }
}

impl Drop for TimeoutGuard<'_> {
    fn drop(&mut self) {
        let id = connection_id(self.conn);
        let enclosing = RUNNING.with(|running| {
            let mut running = running.borrow_mut();
            let Some(stack) = running.get_mut(&id) else {
                return None;
            };
            stack.pop();
            let enclosing = stack.last().cloned().flatten();
            if stack.is_empty() {
                running.remove(&id);
            }
            enclosing
        });
        install_handler(self.conn, enclosing.as_ref());
    }
}

fn connection_id(conn: &Connection) -> usize {
    conn as *const Connection as usize
}

fn install_handler(conn: &Connection, clock: Option<&Arc<StatementClock>>) {
    match clock {
        Some(clock) => {
            let clock = Arc::clone(clock);
            conn.progress_handler(PROGRESS_STEPS, Some(move || clock.expired()));
        }
        None => conn.progress_handler(0, None::<fn() -> bool>),
    }
}

/// Runs a query, handing each row and the result column names to `on_row`.
///
/// Time spent in `on_row` is not charged to the statement timeout.
pub(crate) fn query_rows<F>(
    context: &PersistenceContext<'_>,
    entity: &str,
    op: &str,
    statement: &Statement,
    mut on_row: F,
) -> BrokerResult<()>
where
    F: FnMut(&[String], &Row<'_>) -> BrokerResult<()>,
{
    log_statement(entity, op, statement);
    let conn = context.connection();
    let guard = TimeoutGuard::arm(conn, context.statement_timeout());
    let fail = |err: rusqlite::Error| execution_failed(entity, op, statement, err);

    let mut prepared = prepare(conn, statement).map_err(fail)?;
    let columns = prepared
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut rows = prepared.raw_query();
    while let Some(row) = rows.next().map_err(fail)? {
        guard.pause();
        let handled = on_row(&columns, row);
        guard.resume();
        handled?;
    }
    Ok(())
}

/// Runs a data-changing statement and returns the affected row count.
pub(crate) fn execute(
    context: &PersistenceContext<'_>,
    entity: &str,
    op: &str,
    statement: &Statement,
) -> BrokerResult<usize> {
    log_statement(entity, op, statement);
    let conn = context.connection();
    let _guard = TimeoutGuard::arm(conn, context.statement_timeout());
    let fail = |err: rusqlite::Error| execution_failed(entity, op, statement, err);

    let mut prepared = prepare(conn, statement).map_err(fail)?;
    prepared.raw_execute().map_err(fail)
}

fn prepare<'c>(conn: &'c Connection, statement: &Statement) -> rusqlite::Result<rusqlite::Statement<'c>> {
    let mut prepared = conn.prepare(statement.sql())?;
    for param in statement.params() {
        let placeholder = param.placeholder();
        let index = prepared
            .parameter_index(&placeholder)?
            .ok_or(rusqlite::Error::InvalidParameterName(placeholder))?;
        prepared.raw_bind_parameter(index, param.value())?;
    }
    Ok(prepared)
}

fn execution_failed(entity: &str, op: &str, statement: &Statement, cause: rusqlite::Error) -> BrokerError {
    log_statement_failure(entity, op, statement, &cause);
    BrokerError::Execution {
        entity: entity.to_string(),
        sql: statement.sql().to_string(),
        source: cause,
    }
}
