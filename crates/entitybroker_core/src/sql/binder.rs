//! Value-to-parameter conversion.
//!
//! # Invariants
//! - Keys bind as hyphenated UUID text, enums as their integer code,
//!   timestamps as `DATETIME_FORMAT` text and XML as its serialized text.
//! - A value whose kind the target field does not accept is rejected, never
//!   coerced.

use crate::broker::{BrokerError, BrokerResult};
use crate::model::{FieldKind, Value};
use rusqlite::types::Value as SqlValue;

/// Storage format of timestamps; sorts lexicographically in time order.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Text(text) => SqlValue::Text(text.clone()),
        Value::Key(key) => SqlValue::Text(key.raw().hyphenated().to_string()),
        Value::DateTime(at) => SqlValue::Text(at.format(DATETIME_FORMAT).to_string()),
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Int16(number) => SqlValue::Integer(i64::from(*number)),
        Value::Int32(number) => SqlValue::Integer(i64::from(*number)),
        Value::Int64(number) => SqlValue::Integer(*number),
        Value::Double(number) => SqlValue::Real(*number),
        Value::Float(number) => SqlValue::Real(f64::from(*number)),
        Value::Decimal(number) => SqlValue::Text(number.to_string()),
        Value::Xml(document) => SqlValue::Text(document.as_str().to_string()),
        Value::Enum(code) => SqlValue::Integer(i64::from(code.code())),
    }
}

/// Converts `value` for a column of `kind`, checking the kind first.
pub(crate) fn bind_value(
    entity: &str,
    field: &str,
    kind: FieldKind,
    value: &Value,
) -> BrokerResult<SqlValue> {
    if !kind.accepts(value) {
        return Err(BrokerError::unsupported(entity, field, value.type_name()));
    }
    Ok(to_sql_value(value))
}

#[cfg(test)]
mod tests {
    use super::{bind_value, to_sql_value};
    use crate::broker::BrokerError;
    use crate::model::{EnumCode, FieldKind, Key, Value};
    use chrono::NaiveDate;
    use rusqlite::types::Value as SqlValue;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn binds_each_kind_to_its_storage_class() {
        let raw = Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(8, 5, 1, 20)
            .unwrap();

        assert_eq!(
            to_sql_value(&Value::Key(Key::new("Study", raw))),
            SqlValue::Text("6f9619ff-8b86-d011-b42d-00c04fc964ff".to_string())
        );
        assert_eq!(
            to_sql_value(&Value::DateTime(at)),
            SqlValue::Text("2024-03-09 08:05:01.020".to_string())
        );
        assert_eq!(to_sql_value(&Value::Bool(true)), SqlValue::Integer(1));
        assert_eq!(
            to_sql_value(&Value::Enum(EnumCode::new(200, "StudyStatusEnum"))),
            SqlValue::Integer(200)
        );
        assert_eq!(
            to_sql_value(&Value::Decimal(Decimal::new(1250, 2))),
            SqlValue::Text("12.50".to_string())
        );
    }

    #[test]
    fn rejects_values_the_field_kind_does_not_accept() {
        let err = bind_value("Study", "StudyDate", FieldKind::DateTime, &Value::Int64(3)).unwrap_err();
        match err {
            BrokerError::UnsupportedType {
                entity,
                name,
                type_name,
            } => {
                assert_eq!(entity, "Study");
                assert_eq!(name, "StudyDate");
                assert_eq!(type_name, "int64");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = bind_value(
            "Study",
            "Status",
            FieldKind::Enum {
                table: "StudyStatusEnum",
            },
            &Value::Enum(EnumCode::new(1, "QueueStatusEnum")),
        )
        .unwrap_err();
        assert!(matches!(err, BrokerError::UnsupportedType { .. }));

        assert_eq!(
            bind_value("Study", "StudyDate", FieldKind::NullableDateTime, &Value::Null).unwrap(),
            SqlValue::Null
        );
    }
}
