//! Atmos API: generic REST resource API over a PostgreSQL schema.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use config::{ApiConfig, Catalog, DatabaseConfig};
pub use db::ConnectionProvider;
pub use error::{AppError, ConfigError};
pub use routes::{api_routes, app, common_routes, AppService};
pub use service::{CompositeWriteCoordinator, ResourceModel, ViewReader};
pub use state::AppState;
