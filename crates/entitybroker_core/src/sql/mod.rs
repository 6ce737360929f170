//! SQL generation.
//!
//! # Responsibility
//! - Compile criteria trees into WHERE/ORDER BY fragments with bound
//!   parameters.
//! - Assemble complete statements for every broker operation.
//!
//! # Invariants
//! - Caller values only ever travel as bound parameters; the SQL text holds
//!   validated identifiers, validated XPath literals and fixed keywords.
//! - Compiling the same input twice yields byte-identical SQL and parameters.

mod binder;
mod builder;
mod compiler;
mod dialect;
mod statement;

pub use binder::{to_sql_value, DATETIME_FORMAT};
pub use builder::{Page, StatementBuilder};
pub use dialect::Dialect;
pub use statement::{BoundParam, Statement};

pub(crate) use statement::ParamSink;
