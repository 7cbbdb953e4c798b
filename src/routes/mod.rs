//! Route tables and the middleware stack.

mod api;
mod common;
pub use api::api_routes;
pub use common::common_routes;

use crate::error::ErrorBody;
use crate::handlers::resource::not_found;
use crate::state::AppState;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The served application: the router behind trailing-slash normalization.
pub type AppService = NormalizePath<Router>;

/// Cross-origin headers only for configured origins. Every OPTIONS request is answered
/// here with an empty 200 before routing.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Errors produced by layers and framework rejections (body limit, timeout) carry
/// plain text or nothing; give them the same `{"error": ..}` body as handler errors.
async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response;
    }
    let message = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "Payload too large",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        _ => status.canonical_reason().unwrap_or("Request failed"),
    };
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    (parts, Json(ErrorBody { error: message.into() })).into_response()
}

/// Full application: common + API routes, JSON 404 fallback, CORS, body limit, timeout, tracing.
/// `/api/device/` routes like `/api/device`.
pub fn app(state: AppState) -> AppService {
    let config = state.config.clone();
    let router = Router::new()
        .merge(common_routes(state.clone()))
        .merge(api_routes(state))
        .fallback(not_found)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(RequestBodyLimitLayer::new(config.body_limit))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(map_response(json_error_body))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .layer(TraceLayer::new_for_http());
    NormalizePath::trim_trailing_slash(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_timeout_response_gets_error_body() {
        let response = json_error_body(StatusCode::REQUEST_TIMEOUT.into_response()).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_of(response).await, serde_json::json!({"error": "Request timed out"}));
    }

    #[tokio::test]
    async fn plain_text_rejection_is_replaced() {
        let text = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let response = json_error_body(text).await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_of(response).await, serde_json::json!({"error": "Payload too large"}));
    }

    #[tokio::test]
    async fn success_and_json_errors_pass_through() {
        let ok = Response::new(Body::empty());
        assert!(json_error_body(ok).await.headers().get(header::CONTENT_TYPE).is_none());

        let handled = crate::error::AppError::Validation("Invalid ID format".into()).into_response();
        let response = json_error_body(handled).await;
        assert_eq!(body_of(response).await, serde_json::json!({"error": "Invalid ID format"}));
    }
}
