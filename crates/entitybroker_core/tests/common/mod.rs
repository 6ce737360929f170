#![allow(dead_code)]

use chrono::NaiveDateTime;
use entitybroker_core::{
    BrokerSettings, ConnectionProvider, Entity, EntityDescriptor, FieldDescriptor, Key,
    PersistedEnum, SqliteConnectionProvider, UpdateColumns, Value, ValueError, XmlDocument,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub const SCHEMA: &str = "
CREATE TABLE [PatientStatusEnum] (
    [Enum] INTEGER PRIMARY KEY NOT NULL,
    [Lookup] TEXT NOT NULL,
    [Description] TEXT NOT NULL,
    [LongDescription] TEXT NULL
);
INSERT INTO [PatientStatusEnum] ([Enum], [Lookup], [Description], [LongDescription]) VALUES
    (300, 'Merged', 'Merged', 'Merged into another patient record'),
    (100, 'Active', 'Active', NULL),
    (200, 'Inactive', 'Inactive', NULL);

CREATE TABLE [Patient] (
    [GUID] TEXT PRIMARY KEY NOT NULL,
    [ServerPartitionGUID] TEXT NULL,
    [PatientsName] TEXT NOT NULL DEFAULT '',
    [PatientId] TEXT NOT NULL DEFAULT '',
    [StatusEnum] INTEGER NOT NULL DEFAULT 100,
    [NumberOfStudies] INTEGER NOT NULL DEFAULT 0,
    [BirthDate] TEXT NULL,
    [CreatedTime] TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    [Balance] TEXT NOT NULL DEFAULT '0',
    [Weight] REAL NOT NULL DEFAULT 0,
    [IsVip] INTEGER NOT NULL DEFAULT 0,
    [Priority] INTEGER NOT NULL DEFAULT 0,
    [Notes] TEXT NULL
);

CREATE TABLE [Study] (
    [GUID] TEXT PRIMARY KEY NOT NULL,
    [PatientGUID] TEXT NOT NULL REFERENCES [Patient] ([GUID]),
    [StudyInstanceUid] TEXT NOT NULL,
    [Modality] TEXT NOT NULL DEFAULT '',
    [StudyDate] TEXT NULL,
    [Header] TEXT NULL
);
";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
    Merged,
}

impl PersistedEnum for PatientStatus {
    const LOOKUP_TABLE: &'static str = "PatientStatusEnum";

    fn code(self) -> i16 {
        match self {
            Self::Active => 100,
            Self::Inactive => 200,
            Self::Merged => 300,
        }
    }

    fn from_code(code: i16) -> Option<Self> {
        match code {
            100 => Some(Self::Active),
            200 => Some(Self::Inactive),
            300 => Some(Self::Merged),
            _ => None,
        }
    }
}

static PATIENT_FIELDS: [FieldDescriptor; 12] = [
    FieldDescriptor::key("ServerPartitionKey"),
    FieldDescriptor::text("PatientsName"),
    FieldDescriptor::text("PatientId"),
    FieldDescriptor::enumeration("StatusEnum", PatientStatus::LOOKUP_TABLE),
    FieldDescriptor::int32("NumberOfStudies"),
    FieldDescriptor::nullable_datetime("BirthDate"),
    FieldDescriptor::datetime("CreatedTime"),
    FieldDescriptor::decimal("Balance"),
    FieldDescriptor::double("Weight"),
    FieldDescriptor::bool("IsVip"),
    FieldDescriptor::int16("Priority"),
    FieldDescriptor::xml("Notes"),
];

pub static PATIENT: EntityDescriptor =
    EntityDescriptor::new("Patient", &PATIENT_FIELDS).with_key_field("PatientIdKey");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patient {
    pub key: Option<Key>,
    pub server_partition_key: Option<Key>,
    pub patients_name: String,
    pub patient_id: String,
    pub status: PatientStatus,
    pub number_of_studies: i32,
    pub birth_date: Option<NaiveDateTime>,
    pub created_time: NaiveDateTime,
    pub balance: Decimal,
    pub weight: f64,
    pub is_vip: bool,
    pub priority: i16,
    pub notes: Option<XmlDocument>,
}

impl Entity for Patient {
    fn descriptor() -> &'static EntityDescriptor {
        &PATIENT
    }

    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    fn set_key(&mut self, key: Key) {
        self.key = Some(key);
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "ServerPartitionKey" => self.server_partition_key = value.get()?,
            "PatientsName" => self.patients_name = value.get()?,
            "PatientId" => self.patient_id = value.get()?,
            "StatusEnum" => self.status = value.into_enum()?,
            "NumberOfStudies" => self.number_of_studies = value.get()?,
            "BirthDate" => self.birth_date = value.get()?,
            "CreatedTime" => self.created_time = value.get()?,
            "Balance" => self.balance = value.get()?,
            "Weight" => self.weight = value.get()?,
            "IsVip" => self.is_vip = value.get()?,
            "Priority" => self.priority = value.get()?,
            "Notes" => self.notes = value.get()?,
            other => return Err(ValueError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        let value = match field {
            "ServerPartitionKey" => self.server_partition_key.clone().into(),
            "PatientsName" => self.patients_name.clone().into(),
            "PatientId" => self.patient_id.clone().into(),
            "StatusEnum" => self.status.to_enum_code().into(),
            "NumberOfStudies" => self.number_of_studies.into(),
            "BirthDate" => self.birth_date.into(),
            "CreatedTime" => self.created_time.into(),
            "Balance" => self.balance.into(),
            "Weight" => self.weight.into(),
            "IsVip" => self.is_vip.into(),
            "Priority" => self.priority.into(),
            "Notes" => self.notes.clone().into(),
            _ => return None,
        };
        Some(value)
    }
}

static STUDY_FIELDS: [FieldDescriptor; 5] = [
    FieldDescriptor::key("PatientKey"),
    FieldDescriptor::text("StudyInstanceUid"),
    FieldDescriptor::text("Modality"),
    FieldDescriptor::nullable_datetime("StudyDate"),
    FieldDescriptor::xml("Header"),
];

pub static STUDY: EntityDescriptor = EntityDescriptor::new("Study", &STUDY_FIELDS);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Study {
    pub key: Option<Key>,
    pub patient_key: Option<Key>,
    pub study_instance_uid: String,
    pub modality: String,
    pub study_date: Option<NaiveDateTime>,
    pub header: Option<XmlDocument>,
}

impl Entity for Study {
    fn descriptor() -> &'static EntityDescriptor {
        &STUDY
    }

    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    fn set_key(&mut self, key: Key) {
        self.key = Some(key);
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "PatientKey" => self.patient_key = value.get()?,
            "StudyInstanceUid" => self.study_instance_uid = value.get()?,
            "Modality" => self.modality = value.get()?,
            "StudyDate" => self.study_date = value.get()?,
            "Header" => self.header = value.get()?,
            other => return Err(ValueError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        let value = match field {
            "PatientKey" => self.patient_key.clone().into(),
            "StudyInstanceUid" => self.study_instance_uid.clone().into(),
            "Modality" => self.modality.clone().into(),
            "StudyDate" => self.study_date.into(),
            "Header" => self.header.clone().into(),
            _ => return None,
        };
        Some(value)
    }
}

/// In-memory database opened through the production provider, with the
/// test schema applied.
pub fn open_db() -> Connection {
    let provider = SqliteConnectionProvider::in_memory(BrokerSettings::default());
    let conn = provider.acquire().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

pub fn patient_columns(name: &str, patient_id: &str) -> UpdateColumns {
    UpdateColumns::new::<Patient>()
        .set("PatientsName", name)
        .set("PatientId", patient_id)
}

pub fn study_columns(patient: &Key, uid: &str, modality: &str) -> UpdateColumns {
    UpdateColumns::new::<Study>()
        .set("PatientKey", patient)
        .set("StudyInstanceUid", uid)
        .set("Modality", modality)
}
