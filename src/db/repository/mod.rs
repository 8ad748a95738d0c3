pub mod appointment;
pub mod finance;
pub mod inventory;
pub mod notification;
pub mod patient;
pub mod sample;
pub mod settings;
pub mod staff;
pub mod supplier;
pub mod test_catalog;
pub mod user;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::DatabaseError;

pub(crate) fn parse_uuid(field: &str, s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::MalformedValue {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_json<T: DeserializeOwned>(field: &str, s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::MalformedValue {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn to_json<T: serde::Serialize>(field: &str, value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::MalformedValue {
        field: field.to_string(),
        reason: e.to_string(),
    })
}
