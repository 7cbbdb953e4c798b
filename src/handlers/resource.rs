//! Generic table handlers: list, read, create, update, delete.

use crate::config::{is_valid_identifier, Catalog, Relation};
use crate::error::AppError;
use crate::extractors::{ResourceId, ResourcePath, NO_RESOURCE};
use crate::handlers::composite;
use crate::response::{created_many, created_one, message};
use crate::service::payload::{parse_body, record_from_json};
use crate::service::{CreateRequest, ResourceModel, READING_WITH_SENSORDATA};
use crate::sql::Record;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Only catalogued tables that pass the identifier pattern and the optional allowlist.
fn resolve_table<'c>(state: &AppState, catalog: &'c Catalog, name: &str) -> Result<&'c Relation, AppError> {
    let unknown = || AppError::NotFound("Unknown resource".into());
    if !is_valid_identifier(name) || !state.config.is_resource_allowed(name) {
        return Err(unknown());
    }
    catalog.table(name).ok_or_else(unknown)
}

pub async fn list(
    State(state): State<AppState>,
    ResourcePath(resource): ResourcePath,
) -> Result<Json<Vec<Record>>, AppError> {
    let catalog = state.db.catalog().await?;
    let table = resolve_table(&state, &catalog, &resource)?;
    let rows = ResourceModel::new(table)
        .get_all(state.db.pool())
        .await
        .map_err(AppError::persistence("Failed to fetch records"))?;
    Ok(Json(rows))
}

pub async fn read(
    State(state): State<AppState>,
    ResourceId { resource, id }: ResourceId,
) -> Result<Json<Record>, AppError> {
    let catalog = state.db.catalog().await?;
    let table = resolve_table(&state, &catalog, &resource)?;
    let row = ResourceModel::new(table)
        .get_by_id(state.db.pool(), id)
        .await
        .map_err(AppError::persistence("Failed to fetch record"))?
        .ok_or_else(|| AppError::NotFound("Not found".into()))?;
    Ok(Json(row))
}

pub async fn create(
    State(state): State<AppState>,
    ResourcePath(resource): ResourcePath,
    body: Bytes,
) -> Result<Response, AppError> {
    if resource == READING_WITH_SENSORDATA.resource {
        return composite::create(&state, &READING_WITH_SENSORDATA, &body).await;
    }
    let request = CreateRequest::from_json(parse_body(&body)?)?;
    let catalog = state.db.catalog().await?;
    let table = resolve_table(&state, &catalog, &resource)?;
    let model = ResourceModel::new(table);
    let response = match request {
        CreateRequest::Single(record) => {
            let id = model
                .create(state.db.pool(), &record)
                .await
                .map_err(AppError::persistence("Creation failed"))?;
            created_one(id).into_response()
        }
        CreateRequest::Bulk(records) => {
            let count = model
                .create_bulk(state.db.pool(), &records)
                .await
                .map_err(AppError::persistence("Creation failed"))?;
            created_many(count).into_response()
        }
    };
    Ok(response)
}

pub async fn update(
    State(state): State<AppState>,
    ResourceId { resource, id }: ResourceId,
    body: Bytes,
) -> Result<Response, AppError> {
    let record = record_from_json(parse_body(&body)?)?;
    let catalog = state.db.catalog().await?;
    let table = resolve_table(&state, &catalog, &resource)?;
    let updated = ResourceModel::new(table)
        .update(state.db.pool(), id, &record)
        .await
        .map_err(AppError::persistence("Update failed"))?;
    if !updated {
        return Err(AppError::NotFound("Not found".into()));
    }
    Ok(message(StatusCode::OK, "Updated successfully").into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    ResourceId { resource, id }: ResourceId,
) -> Result<Response, AppError> {
    let catalog = state.db.catalog().await?;
    let table = resolve_table(&state, &catalog, &resource)?;
    let deleted = ResourceModel::new(table)
        .delete(state.db.pool(), id)
        .await
        .map_err(AppError::persistence("Deletion failed"))?;
    if !deleted {
        return Err(AppError::NotFound("Not found".into()));
    }
    Ok(message(StatusCode::OK, "Deleted successfully").into_response())
}

/// PUT or DELETE on a collection path.
pub async fn missing_id() -> AppError {
    AppError::Validation("Missing ID for operation".into())
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// The resource and id format are checked before the method.
pub async fn method_not_allowed_with_id(_: ResourceId) -> AppError {
    AppError::MethodNotAllowed
}

pub async fn missing_resource() -> AppError {
    AppError::Validation(NO_RESOURCE.into())
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}
