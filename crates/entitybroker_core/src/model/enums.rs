//! Persisted enumerations stored by integer code.

use std::hash::{Hash, Hasher};

/// Enumeration persisted as a 16-bit code with a lookup table of display text.
///
/// Implementations are plain Rust enums; the code is the only persisted
/// identity.
pub trait PersistedEnum: Sized + Copy {
    /// Table holding `Enum`, `Lookup`, `Description` and `LongDescription`.
    const LOOKUP_TABLE: &'static str;

    fn code(self) -> i16;

    fn from_code(code: i16) -> Option<Self>;

    fn to_enum_code(self) -> EnumCode {
        EnumCode::new(self.code(), Self::LOOKUP_TABLE)
    }
}

/// Type-erased persisted enum value, as bound and as read from a row.
#[derive(Debug, Clone, Copy)]
pub struct EnumCode {
    code: i16,
    table: &'static str,
}

impl EnumCode {
    pub const fn new(code: i16, table: &'static str) -> Self {
        Self { code, table }
    }

    pub fn code(&self) -> i16 {
        self.code
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn decode<E: PersistedEnum>(self) -> Option<E> {
        E::from_code(self.code)
    }
}

impl PartialEq for EnumCode {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for EnumCode {}

impl Hash for EnumCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}
