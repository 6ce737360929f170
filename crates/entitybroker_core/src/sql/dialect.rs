//! Per-engine rendering differences.

use crate::model::XmlPath;

/// Target SQL dialect. The broker executes `Sqlite`; `SqlServer` renders
/// the shapes expected by existing SQL Server schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    SqlServer,
    #[default]
    Sqlite,
}

impl Dialect {
    /// Bracket-delimits a validated identifier.
    pub fn quote(identifier: &str) -> String {
        format!("[{identifier}]")
    }

    pub fn qualified(table: &str, column: &str) -> String {
        format!("{}.{}", Self::quote(table), Self::quote(column))
    }

    /// Left operand of LIKE, concatenated with an empty literal.
    pub fn like_operand(self, column_sql: &str) -> String {
        match self {
            Self::SqlServer => format!("{column_sql}+''"),
            Self::Sqlite => format!("{column_sql}||''"),
        }
    }

    /// Text selected by `path` inside an XML column.
    pub fn xml_value(self, column_sql: &str, path: &XmlPath) -> String {
        match self {
            Self::SqlServer => format!("{column_sql}.value('{}','text')", path.as_str()),
            Self::Sqlite => format!("xml_value({column_sql}, '{}')", path.as_str()),
        }
    }

    /// Single-row select: `(prefix, suffix)` around `FROM ... WHERE ... ORDER BY ...`.
    pub fn single_row(self) -> (&'static str, &'static str) {
        match self {
            Self::SqlServer => ("SELECT TOP 1 *", ""),
            Self::Sqlite => ("SELECT *", " LIMIT 1"),
        }
    }
}
