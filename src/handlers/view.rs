//! View read handler.

use crate::error::AppError;
use crate::extractors::{ApiPath, DeviceFilter};
use crate::response::error_body;
use crate::service::{ViewReader, ViewResult};
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

/// Unknown or failing views answer 200 with an error body naming the sanitized view.
pub async fn read_view(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    DeviceFilter(device_id): DeviceFilter,
) -> Result<Response, AppError> {
    let reader = ViewReader::new(&state.db, &state.config);
    let result = match device_id {
        Some(device_id) => reader.get_filtered_from_view(&name, device_id).await?,
        None => reader.get_all_from_view(&name).await?,
    };
    Ok(match result {
        ViewResult::Rows(rows) => Json(rows).into_response(),
        ViewResult::Unavailable(view) => Json(error_body(ViewResult::message(&view))).into_response(),
    })
}

pub async fn missing_view_name() -> AppError {
    AppError::Validation("View name is required".into())
}
