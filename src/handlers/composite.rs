//! Composite write handler.

use crate::error::AppError;
use crate::response::message;
use crate::service::payload::parse_body;
use crate::service::{CompositeSpec, CompositeWriteCoordinator, CompositeWritePlan};
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Payload is validated before the catalog is consulted or a transaction opened.
pub async fn create(state: &AppState, spec: &CompositeSpec, body: &[u8]) -> Result<Response, AppError> {
    let plan = CompositeWritePlan::from_json(spec, parse_body(body)?)?;
    let catalog = state.db.catalog().await?;
    let coordinator = CompositeWriteCoordinator::new(spec, &catalog)?;
    coordinator.execute(state.db.pool(), &plan).await?;
    Ok(message(StatusCode::CREATED, "Created successfully").into_response())
}
