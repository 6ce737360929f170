//! Lookup-table access for persisted enums.

use super::error::{BrokerError, BrokerResult};
use super::executor::query_rows;
use crate::db::PersistenceContext;
use crate::mapping::naming;
use crate::mapping::{MappingError, MappingErrorKind};
use crate::model::PersistedEnum;
use crate::sql::{Dialect, ParamSink, Statement};
use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use std::marker::PhantomData;

const CODE_COLUMN: &str = "Enum";
const LOOKUP_COLUMN: &str = "Lookup";

/// One row of an enum lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLookup {
    pub code: i16,
    pub lookup: String,
    pub description: String,
    pub long_description: String,
}

impl EnumLookup {
    pub fn value<E: PersistedEnum>(&self) -> Option<E> {
        E::from_code(self.code)
    }
}

/// Reads the lookup table of `E`.
pub struct EnumBroker<'a, E: PersistedEnum> {
    context: &'a PersistenceContext<'a>,
    _enum: PhantomData<fn() -> E>,
}

impl<'a, E: PersistedEnum> EnumBroker<'a, E> {
    pub fn bind(context: &'a PersistenceContext<'a>) -> Self {
        Self {
            context,
            _enum: PhantomData,
        }
    }

    /// Every defined value, ordered by code.
    pub fn load_all(&self) -> BrokerResult<Vec<EnumLookup>> {
        let table = lookup_table::<E>()?;
        let sql = format!(
            "SELECT * FROM {table} ORDER BY {} ASC",
            Dialect::quote(CODE_COLUMN)
        );
        self.collect("load_enum", &Statement::new(sql, ParamSink::default()))
    }

    /// Lookup row of one value, or `None` when the table lacks its code.
    pub fn lookup(&self, value: E) -> BrokerResult<Option<EnumLookup>> {
        let table = lookup_table::<E>()?;
        let mut sink = ParamSink::default();
        let placeholder = sink.bind(CODE_COLUMN, SqlValue::Integer(i64::from(value.code())));
        let sql = format!(
            "SELECT * FROM {table} WHERE {} = {placeholder}",
            Dialect::quote(CODE_COLUMN)
        );
        Ok(self
            .collect("lookup_enum", &Statement::new(sql, sink))?
            .into_iter()
            .next())
    }

    fn collect(&self, op: &str, statement: &Statement) -> BrokerResult<Vec<EnumLookup>> {
        let mut found = Vec::new();
        query_rows(self.context, E::LOOKUP_TABLE, op, statement, |_, row| {
            found.push(parse_lookup_row(row).map_err(|err| {
                BrokerError::invalid_data(E::LOOKUP_TABLE, format!("lookup row: {err}"))
            })?);
            Ok(())
        })?;
        Ok(found)
    }
}

fn lookup_table<E: PersistedEnum>() -> BrokerResult<String> {
    if !naming::is_valid_identifier(E::LOOKUP_TABLE) {
        return Err(MappingError::new(
            E::LOOKUP_TABLE,
            E::LOOKUP_TABLE,
            MappingErrorKind::InvalidIdentifier,
        )
        .into());
    }
    Ok(Dialect::quote(E::LOOKUP_TABLE))
}

fn parse_lookup_row(row: &Row<'_>) -> rusqlite::Result<EnumLookup> {
    Ok(EnumLookup {
        code: row.get(CODE_COLUMN)?,
        lookup: row.get(LOOKUP_COLUMN)?,
        description: row
            .get::<_, Option<String>>("Description")?
            .unwrap_or_default(),
        long_description: row
            .get::<_, Option<String>>("LongDescription")?
            .unwrap_or_default(),
    })
}
