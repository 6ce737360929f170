//! Statement assembly for every broker operation.
//!
//! # Responsibility
//! - Combine compiled WHERE and ORDER BY fragments with the statement shape
//!   of each operation (select, paged select, count, update, insert, delete).
//!
//! # Invariants
//! - Paged and single-row selects always order by the sort leaves followed
//!   by the primary key, so a single-row fetch agrees with the first row of
//!   any page starting at zero.
//! - Insert and update reject empty column sets before generating SQL.

use super::binder::bind_value;
use super::compiler::{order_by, CriteriaCompiler};
use super::dialect::Dialect;
use super::statement::{ParamSink, Statement, WhereClause};
use crate::broker::{BrokerError, BrokerResult};
use crate::criteria::{SelectCriteria, UpdateColumns};
use crate::mapping::naming::{PRIMARY_KEY_COLUMN, ROW_NUMBER_COLUMN};
use crate::mapping::{type_map, MappingError, MappingErrorKind, TypeMap};
use crate::model::{Entity, EntityDescriptor, Key, Value};
use rusqlite::types::Value as SqlValue;

const PRIMARY_KEY_PARAM: &str = "PrimaryKey";
const START_ROW_PARAM: &str = "StartRowIndex";
const MAX_ROWS_PARAM: &str = "MaximumRows";

/// Zero-based row window of a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    start_index: u32,
    max_rows: u32,
}

impl Page {
    pub const fn new(start_index: u32, max_rows: u32) -> Self {
        Self {
            start_index,
            max_rows,
        }
    }

    /// The `(0, 1)` window served by the single-row fast path.
    pub const fn first_row() -> Self {
        Self::new(0, 1)
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    pub fn is_first_row(&self) -> bool {
        self.start_index == 0 && self.max_rows == 1
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatementBuilder {
    dialect: Dialect,
}

impl StatementBuilder {
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `SELECT *`, optionally windowed by `page`.
    pub fn select(&self, criteria: &SelectCriteria, page: Option<Page>) -> BrokerResult<Statement> {
        let map = type_map::resolve(criteria.descriptor())?;
        let table = Dialect::quote(map.entity());
        let mut sink = ParamSink::default();
        let clause = CriteriaCompiler::new(self.dialect, &mut sink).compile(criteria)?;
        let order = order_by(criteria, &map)?;
        let filter = clause.render();

        let Some(page) = page else {
            let sql = format!("SELECT * FROM {table}{filter}{}", order.render());
            return Ok(Statement::new(sql, sink));
        };

        let order = order.with_tiebreak(&Dialect::qualified(map.entity(), PRIMARY_KEY_COLUMN));
        if page.is_first_row() {
            let (prefix, suffix) = self.dialect.single_row();
            let sql = format!("{prefix} FROM {table}{filter}{}{suffix}", order.render());
            return Ok(Statement::new(sql, sink));
        }

        let start = sink.bind(START_ROW_PARAM, SqlValue::Integer(i64::from(page.start_index)));
        let max = sink.bind(MAX_ROWS_PARAM, SqlValue::Integer(i64::from(page.max_rows)));
        let window = if page.start_index == 0 {
            format!("{ROW_NUMBER_COLUMN} BETWEEN {start} AND {max}")
        } else {
            format!("{ROW_NUMBER_COLUMN} BETWEEN ({start} + 1) AND ({start} + {max})")
        };
        let details = Dialect::quote(&format!("{}Details", map.entity()));
        let sql = format!(
            "SELECT {details}.* FROM (SELECT {table}.*, ROW_NUMBER() OVER({}) AS {ROW_NUMBER_COLUMN} FROM {table}{filter}) AS {details} WHERE {window} ORDER BY {ROW_NUMBER_COLUMN}",
            order.terms()
        );
        Ok(Statement::new(sql, sink))
    }

    pub fn select_by_key(&self, descriptor: &'static EntityDescriptor, key: &Key) -> BrokerResult<Statement> {
        let map = type_map::resolve(descriptor)?;
        let mut sink = ParamSink::default();
        let filter = key_filter(&mut sink, key);
        let sql = format!("SELECT * FROM {}{}", Dialect::quote(map.entity()), filter.render());
        Ok(Statement::new(sql, sink))
    }

    /// `SELECT COUNT(*)`; sort leaves are ignored.
    pub fn count(&self, criteria: &SelectCriteria) -> BrokerResult<Statement> {
        let map = type_map::resolve(criteria.descriptor())?;
        let mut sink = ParamSink::default();
        let clause = CriteriaCompiler::new(self.dialect, &mut sink).compile(criteria)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            Dialect::quote(map.entity()),
            clause.render()
        );
        Ok(Statement::new(sql, sink))
    }

    pub fn update_by_key(&self, key: &Key, columns: &UpdateColumns) -> BrokerResult<Statement> {
        let map = type_map::resolve(columns.descriptor())?;
        let mut sink = ParamSink::default();
        let assignments = set_list(&map, columns, &mut sink)?;
        let filter = key_filter(&mut sink, key);
        let sql = format!(
            "UPDATE {} SET {assignments}{}",
            Dialect::quote(map.entity()),
            filter.render()
        );
        Ok(Statement::new(sql, sink))
    }

    pub fn update_by_criteria(
        &self,
        criteria: &SelectCriteria,
        columns: &UpdateColumns,
    ) -> BrokerResult<Statement> {
        same_entity(criteria.descriptor(), columns.descriptor())?;
        let map = type_map::resolve(columns.descriptor())?;
        let mut sink = ParamSink::default();
        let assignments = set_list(&map, columns, &mut sink)?;
        let clause = CriteriaCompiler::new(self.dialect, &mut sink).compile(criteria)?;
        let sql = format!(
            "UPDATE {} SET {assignments}{}",
            Dialect::quote(map.entity()),
            clause.render()
        );
        Ok(Statement::new(sql, sink))
    }

    /// Writes every mapped field of `entity`; `None` when it has no fields.
    pub fn update_entity<E: Entity>(&self, entity: &E) -> BrokerResult<Option<Statement>> {
        let map = type_map::resolve(E::descriptor())?;
        let key = entity.key().ok_or_else(|| {
            BrokerError::invariant(map.entity(), "cannot update an entity without a key")
        })?;
        if map.is_empty() {
            return Ok(None);
        }

        let mut columns = UpdateColumns::for_descriptor(E::descriptor());
        for mapping in map.mappings() {
            let value = entity.field_value(mapping.field()).ok_or_else(|| {
                MappingError::new(map.entity(), mapping.field(), MappingErrorKind::UnknownField)
            })?;
            columns.insert(mapping.field(), value);
        }
        self.update_by_key(key, &columns).map(Some)
    }

    /// `INSERT` of `columns` under the pre-generated `key`.
    pub fn insert(&self, key: &Key, columns: &UpdateColumns) -> BrokerResult<Statement> {
        let map = type_map::resolve(columns.descriptor())?;
        if columns.is_empty() {
            return Err(BrokerError::invariant(
                map.entity(),
                "insert requires at least one column",
            ));
        }

        let mut sink = ParamSink::default();
        let mut names = vec![Dialect::quote(PRIMARY_KEY_COLUMN)];
        let mut placeholders = vec![sink.bind(PRIMARY_KEY_PARAM, key_value(key))];
        for (field, value) in columns.iter() {
            let (column, bound) = bind_column(&map, field, value)?;
            placeholders.push(sink.bind(&column, bound));
            names.push(Dialect::quote(&column));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Dialect::quote(map.entity()),
            names.join(", "),
            placeholders.join(", ")
        );
        Ok(Statement::new(sql, sink))
    }

    pub fn delete_by_key(&self, descriptor: &'static EntityDescriptor, key: &Key) -> BrokerResult<Statement> {
        let map = type_map::resolve(descriptor)?;
        let mut sink = ParamSink::default();
        let filter = key_filter(&mut sink, key);
        let sql = format!("DELETE FROM {}{}", Dialect::quote(map.entity()), filter.render());
        Ok(Statement::new(sql, sink))
    }

    /// `DELETE` filtered by `criteria`.
    ///
    /// A criteria tree without predicates deletes the whole table; that is
    /// refused unless `allow_unfiltered` is set.
    pub fn delete_by_criteria(
        &self,
        criteria: &SelectCriteria,
        allow_unfiltered: bool,
    ) -> BrokerResult<Statement> {
        let map = type_map::resolve(criteria.descriptor())?;
        let mut sink = ParamSink::default();
        let clause = CriteriaCompiler::new(self.dialect, &mut sink).compile(criteria)?;
        if clause.is_empty() && !allow_unfiltered {
            return Err(BrokerError::invariant(
                map.entity(),
                "delete criteria has no predicates and would remove every row",
            ));
        }
        let sql = format!("DELETE FROM {}{}", Dialect::quote(map.entity()), clause.render());
        Ok(Statement::new(sql, sink))
    }
}

fn key_value(key: &Key) -> SqlValue {
    SqlValue::Text(key.raw().hyphenated().to_string())
}

fn key_filter(sink: &mut ParamSink, key: &Key) -> WhereClause {
    let placeholder = sink.bind(PRIMARY_KEY_PARAM, key_value(key));
    let mut filter = WhereClause::default();
    filter.push(format!("{} = {placeholder}", Dialect::quote(PRIMARY_KEY_COLUMN)));
    filter
}

fn set_list(map: &TypeMap, columns: &UpdateColumns, sink: &mut ParamSink) -> BrokerResult<String> {
    if columns.is_empty() {
        return Err(BrokerError::invariant(
            map.entity(),
            "update requires at least one column",
        ));
    }
    let mut assignments = Vec::with_capacity(columns.len());
    for (field, value) in columns.iter() {
        let (column, bound) = bind_column(map, field, value)?;
        let placeholder = sink.bind(&column, bound);
        assignments.push(format!("{} = {placeholder}", Dialect::quote(&column)));
    }
    Ok(assignments.join(", "))
}

/// Resolves a writable field and binds its value.
fn bind_column(map: &TypeMap, field: &str, value: &Value) -> BrokerResult<(String, SqlValue)> {
    if map.is_key_field(field) {
        return Err(BrokerError::invariant(
            map.entity(),
            format!("key field `{field}` cannot be written"),
        ));
    }
    let mapping = map.field(field).ok_or_else(|| {
        MappingError::new(map.entity(), field, MappingErrorKind::UnknownField)
    })?;
    let bound = bind_value(map.entity(), field, mapping.kind(), value)?;
    Ok((mapping.column().to_string(), bound))
}

fn same_entity(
    criteria: &'static EntityDescriptor,
    columns: &'static EntityDescriptor,
) -> BrokerResult<()> {
    if criteria.name == columns.name {
        return Ok(());
    }
    Err(BrokerError::invariant(
        criteria.name,
        format!("update columns target `{}`", columns.name),
    ))
}
