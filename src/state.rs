//! Shared application state for all routes.

use crate::config::ApiConfig;
use crate::db::ConnectionProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: ConnectionProvider,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        AppState {
            db: ConnectionProvider::new(&config.database),
            config: Arc::new(config),
        }
    }
}
