mod common;

use common::{Patient, PatientStatus, PATIENT};
use entitybroker_core::{
    BrokerError, Dialect, Key, Page, PersistedEnum, SearchCondition, SelectCriteria,
    StatementBuilder, UpdateColumns,
};
use rusqlite::types::Value as SqlValue;

#[test]
fn unpaged_select_orders_only_by_sort_leaves() {
    let criteria = SelectCriteria::new::<Patient>()
        .with("PatientsName", SearchCondition::sort_desc(1))
        .with("PatientId", SearchCondition::sort_asc(0));

    let statement = StatementBuilder::new(Dialect::SqlServer)
        .select(&criteria, None)
        .unwrap();

    assert_eq!(
        statement.sql(),
        "SELECT * FROM [Patient] ORDER BY [Patient].[PatientId] ASC, [Patient].[PatientsName] DESC"
    );
}

#[test]
fn first_row_fetch_uses_single_row_fast_path() {
    let criteria =
        SelectCriteria::new::<Patient>().with("PatientsName", SearchCondition::sort_asc(0));

    let server = StatementBuilder::new(Dialect::SqlServer)
        .select(&criteria, Some(Page::first_row()))
        .unwrap();
    let sqlite = StatementBuilder::new(Dialect::Sqlite)
        .select(&criteria, Some(Page::new(0, 1)))
        .unwrap();

    assert_eq!(
        server.sql(),
        "SELECT TOP 1 * FROM [Patient] ORDER BY [Patient].[PatientsName] ASC, [Patient].[GUID] ASC"
    );
    assert_eq!(
        sqlite.sql(),
        "SELECT * FROM [Patient] ORDER BY [Patient].[PatientsName] ASC, [Patient].[GUID] ASC LIMIT 1"
    );
    assert!(server.params().is_empty());
}

#[test]
fn windowed_page_falls_back_to_key_order() {
    let criteria = SelectCriteria::new::<Patient>();

    let statement = StatementBuilder::new(Dialect::SqlServer)
        .select(&criteria, Some(Page::new(10, 5)))
        .unwrap();

    assert_eq!(
        statement.sql(),
        "SELECT [PatientDetails].* FROM (SELECT [Patient].*, ROW_NUMBER() OVER(ORDER BY [Patient].[GUID] ASC) AS RowNum \
         FROM [Patient]) AS [PatientDetails] \
         WHERE RowNum BETWEEN (@StartRowIndex + 1) AND (@StartRowIndex + @MaximumRows) ORDER BY RowNum"
    );
    assert_eq!(statement.param("StartRowIndex"), Some(&SqlValue::Integer(10)));
    assert_eq!(statement.param("MaximumRows"), Some(&SqlValue::Integer(5)));
}

#[test]
fn windowed_page_from_zero_uses_inclusive_row_range() {
    let criteria = SelectCriteria::new::<Patient>()
        .with("NumberOfStudies", SearchCondition::more_than(0_i32))
        .with("PatientsName", SearchCondition::sort_asc(0));

    let statement = StatementBuilder::new(Dialect::Sqlite)
        .select(&criteria, Some(Page::new(0, 25)))
        .unwrap();

    assert_eq!(
        statement.sql(),
        "SELECT [PatientDetails].* FROM (SELECT [Patient].*, ROW_NUMBER() OVER(ORDER BY [Patient].[PatientsName] ASC, [Patient].[GUID] ASC) AS RowNum \
         FROM [Patient] WHERE [NumberOfStudies] > @NumberOfStudies) AS [PatientDetails] \
         WHERE RowNum BETWEEN @StartRowIndex AND @MaximumRows ORDER BY RowNum"
    );
}

#[test]
fn count_ignores_sort_leaves() {
    let criteria = SelectCriteria::new::<Patient>()
        .with("NumberOfStudies", SearchCondition::more_than(2_i32))
        .with("PatientsName", SearchCondition::sort_asc(0));

    let statement = StatementBuilder::new(Dialect::SqlServer)
        .count(&criteria)
        .unwrap();

    assert_eq!(
        statement.sql(),
        "SELECT COUNT(*) FROM [Patient] WHERE [NumberOfStudies] > @NumberOfStudies"
    );
}

#[test]
fn update_by_key_sets_columns_and_filters_on_guid() {
    let key = Key::generate("Patient");
    let columns = UpdateColumns::new::<Patient>()
        .set("PatientsName", "Doe^Jane")
        .set("StatusEnum", PatientStatus::Merged.to_enum_code());

    let statement = StatementBuilder::default()
        .update_by_key(&key, &columns)
        .unwrap();

    assert_eq!(
        statement.sql(),
        "UPDATE [Patient] SET [PatientsName] = @PatientsName, [StatusEnum] = @StatusEnum WHERE [GUID] = @PrimaryKey"
    );
    assert_eq!(statement.param("StatusEnum"), Some(&SqlValue::Integer(300)));
    assert_eq!(
        statement.param("PrimaryKey"),
        Some(&SqlValue::Text(key.raw().to_string()))
    );
}

#[test]
fn update_by_criteria_reuses_compiled_where() {
    let criteria = SelectCriteria::new::<Patient>().with(
        "StatusEnum",
        SearchCondition::equal_to(PatientStatus::Inactive.to_enum_code()),
    );
    let columns = UpdateColumns::new::<Patient>()
        .set("StatusEnum", PatientStatus::Active.to_enum_code());

    let statement = StatementBuilder::default()
        .update_by_criteria(&criteria, &columns)
        .unwrap();

    assert_eq!(
        statement.sql(),
        "UPDATE [Patient] SET [StatusEnum] = @StatusEnum WHERE [StatusEnum] = @StatusEnum_2"
    );
    assert_eq!(statement.param("StatusEnum"), Some(&SqlValue::Integer(100)));
    assert_eq!(statement.param("StatusEnum_2"), Some(&SqlValue::Integer(200)));
}

#[test]
fn empty_update_is_rejected() {
    let key = Key::generate("Patient");
    let err = StatementBuilder::default()
        .update_by_key(&key, &UpdateColumns::new::<Patient>())
        .unwrap_err();

    assert!(matches!(err, BrokerError::InvariantViolation { .. }));
}

#[test]
fn insert_lists_guid_first() {
    let key = Key::generate("Patient");
    let partition = Key::generate("ServerPartition");
    let columns = UpdateColumns::new::<Patient>()
        .set("PatientsName", "Doe^John")
        .set("ServerPartitionKey", &partition);

    let statement = StatementBuilder::default().insert(&key, &columns).unwrap();

    assert_eq!(
        statement.sql(),
        "INSERT INTO [Patient] ([GUID], [PatientsName], [ServerPartitionGUID]) \
         VALUES (@PrimaryKey, @PatientsName, @ServerPartitionGUID)"
    );
    assert_eq!(
        statement.param("ServerPartitionGUID"),
        Some(&SqlValue::Text(partition.raw().to_string()))
    );
}

#[test]
fn insert_rejects_empty_columns_and_key_writes() {
    let key = Key::generate("Patient");

    let empty = StatementBuilder::default()
        .insert(&key, &UpdateColumns::new::<Patient>())
        .unwrap_err();
    assert!(matches!(empty, BrokerError::InvariantViolation { .. }));

    let keyed = UpdateColumns::new::<Patient>().set("PatientIdKey", &key);
    let err = StatementBuilder::default().insert(&key, &keyed).unwrap_err();
    assert!(matches!(err, BrokerError::InvariantViolation { .. }));
}

#[test]
fn delete_shapes_and_unfiltered_guard() {
    let key = Key::generate("Patient");
    let by_key = StatementBuilder::default()
        .delete_by_key(&PATIENT, &key)
        .unwrap();
    assert_eq!(by_key.sql(), "DELETE FROM [Patient] WHERE [GUID] = @PrimaryKey");

    let criteria =
        SelectCriteria::new::<Patient>().with("PatientId", SearchCondition::equal_to("MRN-9"));
    let filtered = StatementBuilder::default()
        .delete_by_criteria(&criteria, false)
        .unwrap();
    assert_eq!(filtered.sql(), "DELETE FROM [Patient] WHERE [PatientId] = @PatientId");

    let everything = SelectCriteria::new::<Patient>()
        .with("PatientsName", SearchCondition::sort_asc(0));
    let refused = StatementBuilder::default()
        .delete_by_criteria(&everything, false)
        .unwrap_err();
    assert!(matches!(refused, BrokerError::InvariantViolation { .. }));

    let allowed = StatementBuilder::default()
        .delete_by_criteria(&everything, true)
        .unwrap();
    assert_eq!(allowed.sql(), "DELETE FROM [Patient]");
}
