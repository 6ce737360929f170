//! Persistence broker core.
//!
//! Compiles criteria trees into parameterized SQL, executes the statements
//! against SQLite and materializes result rows into entities.
//!
//! # See also
//! - `broker::EntityBroker` for the per-entity operations.
//! - `mapping::type_map` for the descriptor registration contract.

pub mod broker;
pub mod config;
pub mod criteria;
pub mod db;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod sql;

pub use broker::{BrokerError, BrokerResult, EntityBroker, EnumBroker, EnumLookup};
pub use config::{BrokerSettings, ConfigError};
pub use criteria::{
    Criteria, CriteriaGroup, RelatedEntityCondition, RelatedTest, SearchCondition, SearchTest,
    SelectCriteria, SortDirection, SortOrder, UpdateColumns, XmlPathCondition, XmlTest,
};
pub use db::{
    ConnectionProvider, DbError, DbResult, DbTarget, PersistenceContext, SqliteConnectionProvider,
    UpdateContext,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use mapping::{MappingError, MappingErrorKind};
pub use model::{
    Entity, EntityDescriptor, EnumCode, FieldDescriptor, FieldKind, FromValue, Key,
    PersistedEnum, Value, ValueError, XmlDocument, XmlError, XmlPath,
};
pub use sql::{BoundParam, Dialect, Page, Statement, StatementBuilder};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
