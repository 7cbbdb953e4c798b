//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
    #[error("invalid identifier in {var}: '{value}'")]
    InvalidIdentifier { var: &'static str, value: String },
    #[error("table '{0}' is not in the schema catalog")]
    MissingTable(&'static str),
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: &'static str, column: &'static str },
}

/// Step of the composite write that failed after the transaction was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    ParentInsert,
    ChildrenInsert,
}

impl TxStage {
    fn client_message(self) -> &'static str {
        match self {
            TxStage::ParentInsert => "Failed to create reading",
            TxStage::ChildrenInsert => "Failed to insert sensor data",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("transaction aborted at {stage:?}: {source}")]
    TransactionAborted {
        stage: TxStage,
        #[source]
        source: Box<AppError>,
    },
    #[error("connection: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("database: {0}")]
    Db(#[source] sqlx::Error),
}

/// Pool and socket failures surface as connection errors rather than query errors.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                AppError::Connection(e)
            }
            other => AppError::Db(other),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// Wraps a lower-level fault with the generic message the client is allowed to see.
    pub fn persistence(context: &'static str) -> impl FnOnce(AppError) -> AppError {
        move |e| match e {
            AppError::Db(source) => AppError::Persistence { context, source },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Config(_)
            | AppError::Persistence { .. }
            | AppError::TransactionAborted { .. }
            | AppError::Connection(_)
            | AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client. Driver detail never leaves the server.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(m) | AppError::NotFound(m) => m.clone(),
            AppError::MethodNotAllowed => "Method not allowed".into(),
            AppError::Persistence { context, .. } => (*context).into(),
            AppError::TransactionAborted { stage, .. } => stage.client_message().into(),
            AppError::Connection(_) => "Database connection failed".into(),
            AppError::Config(_) => "Server misconfigured".into(),
            AppError::Db(_) => "Database error".into(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
