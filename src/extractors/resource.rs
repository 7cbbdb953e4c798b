//! Path extractors for `/api/{resource}` and `/api/{resource}/{id}`.
//! Rejections are `AppError`, so malformed paths still answer with a JSON error body.

use crate::config::parse_numeric_id;
use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

pub const NO_RESOURCE: &str = "No resource specified";

/// `Path<T>` with the rejection mapped to a validation error.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

fn require_resource(resource: String) -> Result<String, AppError> {
    if resource.is_empty() {
        return Err(AppError::Validation(NO_RESOURCE.into()));
    }
    Ok(resource)
}

/// Collection path. An empty segment is a missing resource.
#[derive(Debug)]
pub struct ResourcePath(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ResourcePath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ApiPath(resource) = ApiPath::<String>::from_request_parts(parts, state).await?;
        Ok(ResourcePath(require_resource(resource)?))
    }
}

/// Item path. The resource is checked before the id format.
#[derive(Debug)]
pub struct ResourceId {
    pub resource: String,
    pub id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ApiPath((resource, raw_id)) = ApiPath::<(String, String)>::from_request_parts(parts, state).await?;
        let resource = require_resource(resource)?;
        let id = parse_numeric_id(&raw_id).ok_or_else(|| AppError::Validation("Invalid ID format".into()))?;
        Ok(ResourceId { resource, id })
    }
}
