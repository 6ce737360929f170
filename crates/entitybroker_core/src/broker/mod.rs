//! Entity brokers and their execution plumbing.
//!
//! # Responsibility
//! - Expose load, find, count, insert, update and delete per entity type.
//! - Execute generated statements on the bound context and materialize rows.
//!
//! # Invariants
//! - A broker is bound to exactly one context at construction.
//! - Every statement of one call runs on that context's connection, so an
//!   insert's read-back observes the uncommitted write.
//! - Failures surface as one `BrokerError`; nothing is retried here.

mod entity_broker;
mod enum_broker;
mod error;
mod executor;
mod materializer;

pub use entity_broker::EntityBroker;
pub use enum_broker::{EnumBroker, EnumLookup};
pub use error::{BrokerError, BrokerResult};
