//! Response body helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct MessageBody {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

pub fn message(status: StatusCode, message: &'static str) -> (StatusCode, Json<MessageBody>) {
    (
        status,
        Json(MessageBody {
            message,
            id: None,
            count: None,
        }),
    )
}

pub fn created_one(id: i64) -> (StatusCode, Json<MessageBody>) {
    let (status, Json(mut body)) = message(StatusCode::CREATED, "Created successfully");
    body.id = Some(id);
    (status, Json(body))
}

pub fn created_many(count: u64) -> (StatusCode, Json<MessageBody>) {
    let (status, Json(mut body)) = message(StatusCode::CREATED, "Created successfully");
    body.count = Some(count);
    (status, Json(body))
}

pub fn error_body(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "error": message.into() })
}
