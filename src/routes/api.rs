//! Generic resource routes under `/api`.
//! `views` and the composite resource are checked before the generic table dispatch.

use crate::handlers::resource::{
    create, delete, list, method_not_allowed, method_not_allowed_with_id, missing_id, missing_resource, read, update,
};
use crate::handlers::view::{missing_view_name, read_view};
use crate::state::AppState;
use axum::{routing::any, routing::get, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api", any(missing_resource))
        .route("/api/", any(missing_resource))
        .route("/api/views", any(missing_view_name))
        .route("/api/views/", any(missing_view_name))
        .route("/api/views/:name", get(read_view).fallback(method_not_allowed))
        .route(
            "/api/:resource",
            get(list)
                .post(create)
                .put(missing_id)
                .delete(missing_id)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/:resource/:id",
            get(read)
                .put(update)
                .delete(delete)
                .fallback(method_not_allowed_with_id),
        )
        .with_state(state)
}
