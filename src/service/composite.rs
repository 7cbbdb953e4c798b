//! Atomic parent + children write: one reading and its sensor values.

use crate::config::Catalog;
use crate::error::{AppError, ConfigError, TxStage};
use crate::service::payload::{check_bulk_size, check_columns, record_from_json, uniform_columns};
use crate::service::ResourceModel;
use crate::sql::Record;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

/// Names tying a composite resource to its two tables.
#[derive(Debug, Clone, Copy)]
pub struct CompositeSpec {
    /// Path segment under `/api` that accepts the composite POST.
    pub resource: &'static str,
    pub parent_table: &'static str,
    pub child_table: &'static str,
    /// Integer field copied from the payload into the parent row.
    pub parent_key: &'static str,
    /// Payload field holding the child entries.
    pub children_field: &'static str,
    /// Child column that receives the parent's generated id.
    pub foreign_key: &'static str,
}

pub const READING_WITH_SENSORDATA: CompositeSpec = CompositeSpec {
    resource: "reading-with-sensordata",
    parent_table: "reading",
    child_table: "sensordata",
    parent_key: "device_id",
    children_field: "sensor_data",
    foreign_key: "reading_id",
};

const INVALID_PAYLOAD: &str = "Invalid or missing payload fields";

#[derive(Debug, PartialEq)]
pub struct CompositeWritePlan {
    pub parent: Record,
    pub children: Vec<Record>,
}

impl CompositeWritePlan {
    /// Shape checks only; no transaction is opened for a malformed payload.
    pub fn from_json(spec: &CompositeSpec, value: Value) -> Result<Self, AppError> {
        let invalid = || AppError::Validation(INVALID_PAYLOAD.into());
        let Value::Object(mut body) = value else {
            return Err(invalid());
        };
        let parent_key = body
            .get(spec.parent_key)
            .filter(|v| v.is_i64() || v.is_u64())
            .cloned()
            .ok_or_else(invalid)?;
        let entries = match body.remove(spec.children_field) {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => return Err(invalid()),
        };
        let children = entries
            .into_iter()
            .map(|entry| record_from_json(entry).map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        uniform_columns(&children)?;

        let mut parent = Record::new();
        parent.insert(spec.parent_key.to_string(), parent_key);
        Ok(CompositeWritePlan { parent, children })
    }

    /// Child rows carrying the parent id, foreign key first.
    fn linked_children(&self, foreign_key: &str, parent_id: i64) -> Vec<Record> {
        self.children
            .iter()
            .map(|child| {
                let mut row = Record::new();
                row.insert(foreign_key.to_string(), Value::from(parent_id));
                for (k, v) in child {
                    if k != foreign_key {
                        row.insert(k.clone(), v.clone());
                    }
                }
                row
            })
            .collect()
    }
}

pub struct CompositeWriteCoordinator<'a> {
    spec: &'a CompositeSpec,
    parents: ResourceModel<'a>,
    children: ResourceModel<'a>,
}

impl<'a> CompositeWriteCoordinator<'a> {
    pub fn new(spec: &'a CompositeSpec, catalog: &'a Catalog) -> Result<Self, AppError> {
        let parent = catalog
            .table(spec.parent_table)
            .ok_or(ConfigError::MissingTable(spec.parent_table))?;
        let child = catalog
            .table(spec.child_table)
            .ok_or(ConfigError::MissingTable(spec.child_table))?;
        Ok(CompositeWriteCoordinator {
            spec,
            parents: ResourceModel::new(parent),
            children: ResourceModel::new(child),
        })
    }

    /// Begin, insert parent, bulk insert children, commit. Any failure after begin rolls back.
    /// Returns the parent's generated id.
    pub async fn execute(&self, pool: &PgPool, plan: &CompositeWritePlan) -> Result<i64, AppError> {
        check_columns(self.parents.relation(), plan.parent.keys())?;
        if let Some(first) = plan.children.first() {
            check_columns(self.children.relation(), first.keys().filter(|k| *k != self.spec.foreign_key))?;
            check_bulk_size(plan.children.len(), first.len() + 1)?;
        }
        if self.children.relation().column(self.spec.foreign_key).is_none() {
            return Err(ConfigError::MissingColumn {
                table: self.spec.child_table,
                column: self.spec.foreign_key,
            }
            .into());
        }

        let mut tx = pool.begin().await?;

        let parent_id = match self.parents.create(&mut *tx, &plan.parent).await {
            Ok(id) => id,
            Err(e) => return Err(abort(tx, TxStage::ParentInsert, e).await),
        };

        let children = plan.linked_children(self.spec.foreign_key, parent_id);
        if let Err(e) = self.children.create_bulk(&mut *tx, &children).await {
            return Err(abort(tx, TxStage::ChildrenInsert, e).await);
        }

        tx.commit().await?;
        tracing::info!(
            resource = %self.spec.resource,
            parent_id,
            children = children.len(),
            "composite write committed"
        );
        Ok(parent_id)
    }
}

async fn abort(tx: Transaction<'_, Postgres>, stage: TxStage, source: AppError) -> AppError {
    if let Err(e) = tx.rollback().await {
        tracing::error!(?stage, error = %e, "rollback failed");
    }
    match source {
        AppError::Connection(_) => source,
        other => AppError::TransactionAborted {
            stage,
            source: Box::new(other),
        },
    }
}
