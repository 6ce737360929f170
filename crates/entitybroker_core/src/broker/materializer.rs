//! Row to entity conversion.
//!
//! # Responsibility
//! - Fill a default-constructed entity from one result row, column by column.
//!
//! # Invariants
//! - The row-number column of windowed selects is skipped.
//! - The `GUID` column sets the entity key; every other column must map to a
//!   declared field, otherwise materialization fails.
//! - A storage class the declared field kind cannot read is an
//!   unsupported-type failure, never a silent coercion.

use super::error::{BrokerError, BrokerResult};
use crate::mapping::naming::{self, PRIMARY_KEY_COLUMN, ROW_NUMBER_COLUMN};
use crate::mapping::{ColumnMapping, MappingError, MappingErrorKind, TypeMap};
use crate::model::{Entity, EnumCode, FieldKind, Key, Value, ValueError, XmlDocument};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::Row;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn materialize<E: Entity>(
    map: &TypeMap,
    columns: &[String],
    row: &Row<'_>,
) -> BrokerResult<E> {
    let entity_name = map.entity();
    let mut entity = E::default();

    for (index, column) in columns.iter().enumerate() {
        if column.eq_ignore_ascii_case(ROW_NUMBER_COLUMN) {
            continue;
        }
        let cell = row.get_ref(index).map_err(|err| {
            BrokerError::invalid_data(entity_name, format!("column `{column}`: {err}"))
        })?;

        if column.eq_ignore_ascii_case(PRIMARY_KEY_COLUMN) {
            let raw = read_uuid(entity_name, column, cell)?.ok_or_else(|| {
                BrokerError::invalid_data(entity_name, "primary key column is NULL")
            })?;
            entity.set_key(Key::new(entity_name, raw));
            continue;
        }

        let mapping = map.field_for_column(column).ok_or_else(|| {
            MappingError::new(entity_name, column.as_str(), MappingErrorKind::UnmappedColumn)
        })?;
        let value = convert(entity_name, mapping, cell)?;
        entity
            .set_field(mapping.field(), value)
            .map_err(|err| field_rejected(entity_name, mapping.field(), err))?;
    }

    Ok(entity)
}

fn convert(entity: &str, mapping: &ColumnMapping, cell: ValueRef<'_>) -> BrokerResult<Value> {
    if let ValueRef::Null = cell {
        return Ok(Value::Null);
    }
    let field = mapping.field();
    let invalid = |detail: String| BrokerError::invalid_data(entity, format!("`{field}`: {detail}"));

    let value = match (mapping.kind(), cell) {
        (FieldKind::Text, ValueRef::Text(_)) => Value::Text(read_text(entity, field, cell)?),
        (FieldKind::Key, ValueRef::Text(_) | ValueRef::Blob(_)) => {
            match read_uuid(entity, field, cell)? {
                Some(raw) => Value::Key(Key::new(naming::referenced_entity(field), raw)),
                None => Value::Null,
            }
        }
        (FieldKind::DateTime | FieldKind::NullableDateTime, ValueRef::Text(_)) => {
            let text = read_text(entity, field, cell)?;
            Value::DateTime(parse_datetime(&text).ok_or_else(|| invalid(format!("unparseable timestamp `{text}`")))?)
        }
        (FieldKind::Bool, ValueRef::Integer(number)) => Value::Bool(number != 0),
        (FieldKind::Int16, ValueRef::Integer(number)) => Value::Int16(
            i16::try_from(number).map_err(|_| invalid(format!("{number} overflows int16")))?,
        ),
        (FieldKind::Int32, ValueRef::Integer(number)) => Value::Int32(
            i32::try_from(number).map_err(|_| invalid(format!("{number} overflows int32")))?,
        ),
        (FieldKind::Int64, ValueRef::Integer(number)) => Value::Int64(number),
        (FieldKind::Double, ValueRef::Real(number)) => Value::Double(number),
        (FieldKind::Double, ValueRef::Integer(number)) => Value::Double(number as f64),
        (FieldKind::Float, ValueRef::Real(number)) => Value::Float(number as f32),
        (FieldKind::Float, ValueRef::Integer(number)) => Value::Float(number as f32),
        (FieldKind::Decimal, ValueRef::Text(_)) => {
            let text = read_text(entity, field, cell)?;
            Value::Decimal(
                Decimal::from_str(text.trim())
                    .map_err(|err| invalid(format!("unparseable decimal `{text}`: {err}")))?,
            )
        }
        (FieldKind::Decimal, ValueRef::Integer(number)) => Value::Decimal(Decimal::from(number)),
        (FieldKind::Decimal, ValueRef::Real(number)) => Value::Decimal(
            Decimal::try_from(number)
                .map_err(|err| invalid(format!("unrepresentable decimal {number}: {err}")))?,
        ),
        (FieldKind::Xml, ValueRef::Text(_)) => {
            let text = read_text(entity, field, cell)?;
            Value::Xml(XmlDocument::parse(text).map_err(|err| invalid(err.to_string()))?)
        }
        (FieldKind::Enum { table }, ValueRef::Integer(number)) => {
            let code = i16::try_from(number)
                .map_err(|_| invalid(format!("enum code {number} overflows int16")))?;
            Value::Enum(EnumCode::new(code, table))
        }
        (_, other) => {
            return Err(BrokerError::unsupported(entity, field, storage_class(other)));
        }
    };
    Ok(value)
}

fn read_text(entity: &str, field: &str, cell: ValueRef<'_>) -> BrokerResult<String> {
    cell.as_str()
        .map(str::to_string)
        .map_err(|err| BrokerError::invalid_data(entity, format!("`{field}`: {err}")))
}

fn read_uuid(entity: &str, column: &str, cell: ValueRef<'_>) -> BrokerResult<Option<Uuid>> {
    let parsed = match cell {
        ValueRef::Null => return Ok(None),
        ValueRef::Text(_) => {
            let text = read_text(entity, column, cell)?;
            Uuid::parse_str(text.trim()).map_err(|err| err.to_string())
        }
        ValueRef::Blob(bytes) => Uuid::from_slice(bytes).map_err(|err| err.to_string()),
        other => return Err(BrokerError::unsupported(entity, column, storage_class(other))),
    };
    parsed
        .map(Some)
        .map_err(|err| BrokerError::invalid_data(entity, format!("`{column}`: invalid key: {err}")))
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn storage_class(cell: ValueRef<'_>) -> &'static str {
    match cell {
        ValueRef::Null => "null",
        ValueRef::Integer(_) => "integer",
        ValueRef::Real(_) => "real",
        ValueRef::Text(_) => "text",
        ValueRef::Blob(_) => "blob",
    }
}

fn field_rejected(entity: &str, field: &str, err: ValueError) -> BrokerError {
    match err {
        ValueError::UnknownField(name) => {
            MappingError::new(entity, name, MappingErrorKind::UnknownField).into()
        }
        other => BrokerError::invalid_data(entity, format!("`{field}`: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_datetime;
    use chrono::NaiveDate;

    #[test]
    fn parses_stored_and_server_default_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(8, 5, 1, 20)
            .unwrap();
        assert_eq!(parse_datetime("2024-03-09 08:05:01.020"), Some(expected));
        assert_eq!(parse_datetime("2024-03-09T08:05:01.020"), Some(expected));

        let whole_second = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 1)
            .unwrap();
        assert_eq!(parse_datetime("2024-03-09 08:05:01"), Some(whole_second));
        assert_eq!(
            parse_datetime("2024-03-09"),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("09/03/2024"), None);
    }
}
