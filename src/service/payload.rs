//! Request payload checks, all applied before any query is built.

use crate::config::Relation;
use crate::error::AppError;
use crate::sql::Record;
use serde_json::Value;

/// Rows accepted by one bulk insert.
pub const BULK_LIMIT: usize = 1000;
/// PostgreSQL wire protocol limit on bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Create payload resolved once at the boundary.
#[derive(Debug, PartialEq)]
pub enum CreateRequest {
    Single(Record),
    Bulk(Vec<Record>),
}

impl CreateRequest {
    /// A bare object is a single insert; `{"items": [...]}` or a top-level array is a bulk insert.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Array(items) => Self::bulk(items),
            Value::Object(mut map) if map.len() == 1 && map.get("items").is_some_and(Value::is_array) => {
                match map.remove("items") {
                    Some(Value::Array(items)) => Self::bulk(items),
                    _ => Err(AppError::Validation("Payload must be a JSON object".into())),
                }
            }
            other => Ok(CreateRequest::Single(record_from_json(other)?)),
        }
    }

    fn bulk(items: Vec<Value>) -> Result<Self, AppError> {
        if items.is_empty() {
            return Err(AppError::Validation("Payload must not be empty".into()));
        }
        let records = items
            .into_iter()
            .map(record_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CreateRequest::Bulk(records))
    }
}

/// Decode a request body; anything that is not JSON is a validation failure.
pub fn parse_body(bytes: &[u8]) -> Result<Value, AppError> {
    serde_json::from_slice(bytes).map_err(|_| AppError::Validation("Invalid JSON".into()))
}

/// A non-empty JSON object.
pub fn record_from_json(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(map) if map.is_empty() => Err(AppError::Validation("Payload must not be empty".into())),
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Validation("Payload must be a JSON object".into())),
    }
}

/// Column list of a batch, taken from the first record; every other record must carry exactly the same keys.
pub fn uniform_columns(records: &[Record]) -> Result<Vec<String>, AppError> {
    let first = records
        .first()
        .ok_or_else(|| AppError::Validation("Payload must not be empty".into()))?;
    let columns: Vec<String> = first.keys().cloned().collect();
    for (idx, record) in records.iter().enumerate().skip(1) {
        if record.len() != columns.len() || !columns.iter().all(|c| record.contains_key(c)) {
            return Err(AppError::Validation(format!(
                "Record {} does not match the columns of the first record",
                idx
            )));
        }
    }
    Ok(columns)
}

/// Every key must be a column of `rel`.
pub fn check_columns<'a>(rel: &Relation, names: impl IntoIterator<Item = &'a String>) -> Result<(), AppError> {
    for name in names {
        if rel.column(name).is_none() {
            return Err(AppError::Validation(format!(
                "Unknown column '{}' for '{}'",
                name, rel.name
            )));
        }
    }
    Ok(())
}

/// Size guard for one multi-row INSERT.
pub fn check_bulk_size(rows: usize, columns: usize) -> Result<(), AppError> {
    if rows > BULK_LIMIT {
        return Err(AppError::Validation(format!(
            "Bulk insert limited to {} records",
            BULK_LIMIT
        )));
    }
    if rows.saturating_mul(columns) > MAX_BIND_PARAMS {
        return Err(AppError::Validation(format!(
            "Bulk insert limited to {} values",
            MAX_BIND_PARAMS
        )));
    }
    Ok(())
}
