//! Connection provider: one lazily-connected pool and the schema catalog, shared through `AppState`.

use crate::config::{Catalog, DatabaseConfig};
use crate::error::AppError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Clone)]
pub struct ConnectionProvider {
    pool: PgPool,
    schema: String,
    catalog: Arc<OnceCell<Arc<Catalog>>>,
}

impl ConnectionProvider {
    /// No connection is attempted until the first query.
    pub fn new(config: &DatabaseConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(connect_options(config));
        ConnectionProvider {
            pool,
            schema: config.schema.clone(),
            catalog: Arc::new(OnceCell::new()),
        }
    }

    /// Use a prebuilt catalog instead of introspecting the database.
    pub fn with_catalog(self, catalog: Catalog) -> Self {
        ConnectionProvider {
            catalog: Arc::new(OnceCell::new_with(Some(Arc::new(catalog)))),
            ..self
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Catalog of the configured schema, loaded on first use. A failed load is retried by the next caller.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, AppError> {
        let catalog = self
            .catalog
            .get_or_try_init(|| async {
                Catalog::load(&self.pool, &self.schema)
                    .await
                    .map(Arc::new)
                    .map_err(|e| catalog_error(&self.schema, e))
            })
            .await?;
        Ok(Arc::clone(catalog))
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Only pool and socket faults are reported as connection failures.
fn catalog_error(schema: &str, e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, schema = %schema, "could not load schema catalog");
    AppError::from(e)
}

fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let mut opts = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.name)
        .application_name(env!("CARGO_PKG_NAME"));
    if !config.password.is_empty() {
        opts = opts.password(&config.password);
    }
    if !config.statement_timeout.is_zero() {
        opts = opts.options([(
            "statement_timeout",
            config.statement_timeout.as_millis().to_string(),
        )]);
    }
    opts
}
