//! Physical naming rules for columns and parameters.

use crate::model::FieldKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// Physical column holding every entity's key.
pub const PRIMARY_KEY_COLUMN: &str = "GUID";
/// Synthetic column added by windowed pagination.
pub const ROW_NUMBER_COLUMN: &str = "RowNum";

const KEY_SUFFIX: &str = "Key";
const ENUM_SUFFIX: &str = "Enum";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Replaces a trailing `Key` with `GUID`; `None` when there is no such suffix.
pub fn key_to_guid(name: &str) -> Option<String> {
    name.strip_suffix(KEY_SUFFIX)
        .map(|stem| format!("{stem}{PRIMARY_KEY_COLUMN}"))
}

/// Column for a field without an explicit override.
pub fn column_for_field(name: &str, kind: FieldKind) -> String {
    if let Some(column) = key_to_guid(name) {
        return column;
    }
    if matches!(kind, FieldKind::Enum { .. }) && !name.ends_with(ENUM_SUFFIX) {
        return format!("{name}{ENUM_SUFFIX}");
    }
    name.to_string()
}

/// Base name of the parameter bound for a criteria leaf on `field`.
pub fn parameter_name(field: &str) -> String {
    key_to_guid(field).unwrap_or_else(|| field.to_string())
}

/// Entity name a key-typed field refers to (`ServerPartitionKey` -> `ServerPartition`).
pub fn referenced_entity(field: &str) -> &str {
    match field.strip_suffix(KEY_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => field,
    }
}

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}
