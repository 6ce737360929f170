//! Generated statements and their parameter lists.

use rusqlite::types::Value as SqlValue;
use std::collections::HashSet;

/// One named parameter; the placeholder in SQL is `@name`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    name: String,
    value: SqlValue,
}

impl BoundParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn placeholder(&self) -> String {
        format!("@{}", self.name)
    }

    pub fn value(&self) -> &SqlValue {
        &self.value
    }
}

/// SQL text plus its bound parameters, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<BoundParam>,
}

impl Statement {
    pub(crate) fn new(sql: String, sink: ParamSink) -> Self {
        Self {
            sql,
            params: sink.params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| &param.value)
    }
}

/// Per-statement parameter collector that keeps names unique.
#[derive(Debug, Default)]
pub(crate) struct ParamSink {
    params: Vec<BoundParam>,
    used: HashSet<String>,
}

impl ParamSink {
    /// Binds `value` under `base` (suffixed `_2`, `_3`, ... on collision)
    /// and returns the placeholder to splice into SQL.
    pub(crate) fn bind(&mut self, base: &str, value: SqlValue) -> String {
        let name = self.unique_name(base);
        let placeholder = format!("@{name}");
        self.used.insert(name.to_ascii_lowercase());
        self.params.push(BoundParam { name, value });
        placeholder
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.used.contains(&base.to_ascii_lowercase()) {
            return base.to_string();
        }
        (2..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| !self.used.contains(&candidate.to_ascii_lowercase()))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Predicates joined with AND.
#[derive(Debug, Clone, Default)]
pub(crate) struct WhereClause {
    predicates: Vec<String>,
}

impl WhereClause {
    pub(crate) fn push(&mut self, predicate: String) {
        self.predicates.push(predicate);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// ` WHERE a AND b`, or an empty string.
    pub(crate) fn render(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct OrderBy {
    terms: Vec<String>,
}

impl OrderBy {
    pub(crate) fn push(&mut self, term: String) {
        self.terms.push(term);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Appends `key_column ASC` unless the key already takes part in the order.
    pub(crate) fn with_tiebreak(mut self, key_column: &str) -> Self {
        let prefix = format!("{key_column} ");
        if !self.terms.iter().any(|term| term.starts_with(&prefix)) {
            self.terms.push(format!("{key_column} ASC"));
        }
        self
    }

    /// `ORDER BY a, b` without a leading space, or an empty string.
    pub(crate) fn terms(&self) -> String {
        if self.terms.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", self.terms.join(", "))
        }
    }

    /// ` ORDER BY a, b`, or an empty string.
    pub(crate) fn render(&self) -> String {
        if self.terms.is_empty() {
            String::new()
        } else {
            format!(" {}", self.terms())
        }
    }
}
