//! Persisted value model shared by the criteria, SQL and broker layers.
//!
//! # Responsibility
//! - Define entity keys, bindable values and persisted enums.
//! - Define the static entity descriptors the type map is built from.
//!
//! # Invariants
//! - Every bindable value kind is one `Value` variant; conversions are
//!   exhaustive matches, never runtime type probing.

pub mod entity;
pub mod enums;
pub mod key;
pub mod value;
pub mod xml;

pub use entity::{Entity, EntityDescriptor, FieldDescriptor, FieldKind};
pub use enums::{EnumCode, PersistedEnum};
pub use key::Key;
pub use value::{FromValue, Value, ValueError};
pub use xml::{XmlDocument, XmlError, XmlPath};
