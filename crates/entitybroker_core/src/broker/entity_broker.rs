//! Per-entity broker.

use super::error::{BrokerError, BrokerResult};
use super::executor::{execute, query_rows};
use super::materializer::materialize;
use crate::criteria::{SelectCriteria, UpdateColumns};
use crate::db::PersistenceContext;
use crate::mapping::type_map;
use crate::model::{Entity, EntityDescriptor, Key};
use crate::sql::{Dialect, Page, Statement, StatementBuilder};
use std::marker::PhantomData;

/// Load/find/count/insert/update/delete for entity type `E`.
///
/// Every call runs synchronously on the bound context; the broker holds no
/// other state.
pub struct EntityBroker<'a, E: Entity> {
    context: &'a PersistenceContext<'a>,
    builder: StatementBuilder,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> EntityBroker<'a, E> {
    pub fn bind(context: &'a PersistenceContext<'a>) -> Self {
        Self {
            context,
            builder: StatementBuilder::new(Dialect::Sqlite),
            _entity: PhantomData,
        }
    }

    pub fn context(&self) -> &'a PersistenceContext<'a> {
        self.context
    }

    /// Loads one row by key.
    pub fn load(&self, key: &Key) -> BrokerResult<Option<E>> {
        let statement = self.builder.select_by_key(E::descriptor(), key)?;
        let mut found = self.collect("load", &statement)?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    /// All rows matching `criteria`, in sort-leaf order when one is given.
    pub fn find(&self, criteria: &SelectCriteria) -> BrokerResult<Vec<E>> {
        self.ensure_entity(criteria.descriptor())?;
        let statement = self.builder.select(criteria, None)?;
        self.collect("find", &statement)
    }

    /// One zero-based window of the rows matching `criteria`.
    pub fn find_page(&self, criteria: &SelectCriteria, page: Page) -> BrokerResult<Vec<E>> {
        self.ensure_entity(criteria.descriptor())?;
        let statement = self.builder.select(criteria, Some(page))?;
        self.collect("find_page", &statement)
    }

    /// First matching row under the same ordering as `find_page`.
    pub fn find_one(&self, criteria: &SelectCriteria) -> BrokerResult<Option<E>> {
        Ok(self
            .find_page(criteria, Page::first_row())?
            .into_iter()
            .next())
    }

    /// Streams each matching row into `callback` instead of collecting.
    pub fn find_each<F>(
        &self,
        criteria: &SelectCriteria,
        page: Option<Page>,
        callback: F,
    ) -> BrokerResult<()>
    where
        F: FnMut(E),
    {
        self.ensure_entity(criteria.descriptor())?;
        let statement = self.builder.select(criteria, page)?;
        self.stream("find_each", &statement, callback)
    }

    pub fn count(&self, criteria: &SelectCriteria) -> BrokerResult<u64> {
        self.ensure_entity(criteria.descriptor())?;
        let statement = self.builder.count(criteria)?;
        let entity = E::descriptor().name;
        let mut total = 0_u64;
        query_rows(self.context, entity, "count", &statement, |_, row| {
            let count: i64 = row
                .get(0)
                .map_err(|err| BrokerError::invalid_data(entity, format!("row count: {err}")))?;
            total = u64::try_from(count).unwrap_or_default();
            Ok(())
        })?;
        Ok(total)
    }

    /// Inserts a row under a fresh key and returns it as re-selected, so
    /// server-side defaults are visible.
    ///
    /// # Errors
    /// - `InvariantViolation` when `columns` is empty or writes the key field.
    pub fn insert(&self, columns: &UpdateColumns) -> BrokerResult<E> {
        self.ensure_entity(columns.descriptor())?;
        let entity = E::descriptor().name;
        let key = Key::generate(entity);
        let statement = self.builder.insert(&key, columns)?;
        execute(self.context, entity, "insert", &statement)?;

        self.load(&key)?.ok_or_else(|| {
            BrokerError::invalid_data(entity, format!("inserted row {key} not found on read-back"))
        })
    }

    /// Updates one row by key; `false` when no row has that key.
    pub fn update(&self, key: &Key, columns: &UpdateColumns) -> BrokerResult<bool> {
        self.ensure_entity(columns.descriptor())?;
        let statement = self.builder.update_by_key(key, columns)?;
        Ok(execute(self.context, E::descriptor().name, "update", &statement)? > 0)
    }

    /// Updates every row matching `criteria`; `false` when none matched.
    pub fn update_where(
        &self,
        criteria: &SelectCriteria,
        columns: &UpdateColumns,
    ) -> BrokerResult<bool> {
        self.ensure_entity(criteria.descriptor())?;
        self.ensure_entity(columns.descriptor())?;
        let statement = self.builder.update_by_criteria(criteria, columns)?;
        Ok(execute(self.context, E::descriptor().name, "update_where", &statement)? > 0)
    }

    /// Writes every mapped field of `entity` back to its row.
    pub fn update_entity(&self, entity: &E) -> BrokerResult<bool> {
        match self.builder.update_entity(entity)? {
            Some(statement) => {
                Ok(execute(self.context, E::descriptor().name, "update_entity", &statement)? > 0)
            }
            None => Ok(true),
        }
    }

    /// Deletes one row by key; `false` when no row has that key.
    pub fn delete(&self, key: &Key) -> BrokerResult<bool> {
        let statement = self.builder.delete_by_key(E::descriptor(), key)?;
        Ok(execute(self.context, E::descriptor().name, "delete", &statement)? > 0)
    }

    /// Deletes every row matching `criteria` and returns how many were removed.
    ///
    /// Criteria without predicates empty the table, which is only allowed
    /// when the context settings set `allow_unfiltered_delete`.
    pub fn delete_where(&self, criteria: &SelectCriteria) -> BrokerResult<usize> {
        self.ensure_entity(criteria.descriptor())?;
        let allow_unfiltered = self.context.settings().allow_unfiltered_delete;
        let statement = self.builder.delete_by_criteria(criteria, allow_unfiltered)?;
        execute(self.context, E::descriptor().name, "delete_where", &statement)
    }

    fn collect(&self, op: &str, statement: &Statement) -> BrokerResult<Vec<E>> {
        let mut found = Vec::new();
        self.stream(op, statement, |entity| found.push(entity))?;
        Ok(found)
    }

    fn stream<F>(&self, op: &str, statement: &Statement, mut callback: F) -> BrokerResult<()>
    where
        F: FnMut(E),
    {
        let map = type_map::resolve(E::descriptor())?;
        query_rows(self.context, map.entity(), op, statement, |columns, row| {
            callback(materialize::<E>(&map, columns, row)?);
            Ok(())
        })
    }

    fn ensure_entity(&self, descriptor: &'static EntityDescriptor) -> BrokerResult<()> {
        let expected = E::descriptor();
        if std::ptr::eq(descriptor, expected) || descriptor == expected {
            return Ok(());
        }
        Err(BrokerError::invariant(
            expected.name,
            format!("criteria for `{}` passed to the `{}` broker", descriptor.name, expected.name),
        ))
    }
}
