//! Read-only access to allowlisted views.

use crate::config::ApiConfig;
use crate::db::ConnectionProvider;
use crate::error::AppError;
use crate::sql::{bind_query, row_to_record, select_view, Record};

/// Stands in for any view name outside the allowlist; never queried.
pub const INVALID_VIEW: &str = "Invalid_View_Name";
/// Column the optional `device_id` filter applies to.
pub const FILTER_COLUMN: &str = "device_id";

#[derive(Debug, PartialEq)]
pub enum ViewResult {
    Rows(Vec<Record>),
    /// Query failed or the view does not exist; carries the sanitized name.
    Unavailable(String),
}

impl ViewResult {
    pub fn message(view: &str) -> String {
        format!("Query failed or view '{}' does not exist.", view)
    }
}

pub struct ViewReader<'a> {
    db: &'a ConnectionProvider,
    config: &'a ApiConfig,
}

impl<'a> ViewReader<'a> {
    pub fn new(db: &'a ConnectionProvider, config: &'a ApiConfig) -> Self {
        ViewReader { db, config }
    }

    /// The name itself when allowlisted, otherwise the sentinel.
    pub fn sanitize<'n>(&self, name: &'n str) -> &'n str {
        if self.config.is_view_allowed(name) {
            name
        } else {
            INVALID_VIEW
        }
    }

    pub async fn get_all_from_view(&self, name: &str) -> Result<ViewResult, AppError> {
        self.fetch(name, None).await
    }

    pub async fn get_filtered_from_view(&self, name: &str, device_id: i64) -> Result<ViewResult, AppError> {
        self.fetch(name, Some(device_id)).await
    }

    async fn fetch(&self, name: &str, device_id: Option<i64>) -> Result<ViewResult, AppError> {
        let safe = self.sanitize(name);
        if safe == INVALID_VIEW {
            tracing::warn!(requested = %name, "view not in allowlist");
            return Ok(ViewResult::Unavailable(INVALID_VIEW.into()));
        }
        let catalog = self.db.catalog().await?;
        let Some(view) = catalog.view(safe) else {
            tracing::warn!(view = %safe, "allowlisted view missing from schema");
            return Ok(ViewResult::Unavailable(safe.into()));
        };
        let filter = match device_id {
            Some(id) => match view.column(FILTER_COLUMN) {
                Some(col) => Some((col, id)),
                None => {
                    tracing::warn!(view = %safe, "view has no '{}' column to filter on", FILTER_COLUMN);
                    return Ok(ViewResult::Unavailable(safe.into()));
                }
            },
            None => None,
        };
        let q = select_view(view, filter);
        match bind_query(&q).fetch_all(self.db.pool()).await {
            Ok(rows) => Ok(ViewResult::Rows(rows.iter().map(row_to_record).collect())),
            Err(e) => match AppError::from(e) {
                AppError::Db(e) => {
                    tracing::error!(view = %safe, error = %e, "view query failed");
                    Ok(ViewResult::Unavailable(safe.into()))
                }
                other => Err(other),
            },
        }
    }
}
