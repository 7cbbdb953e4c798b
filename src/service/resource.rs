//! Generic CRUD over one catalogued table.

use crate::config::{Relation, ID_COLUMN};
use crate::error::AppError;
use crate::service::payload::{check_bulk_size, check_columns, uniform_columns};
use crate::sql::{bind_query, delete, insert, insert_bulk, row_to_record, select_all, select_by_id, update, Record};
use sqlx::{PgExecutor, Row};

/// Every operation runs exactly one statement on the executor it is given,
/// so the same model works on the pool or inside a transaction.
pub struct ResourceModel<'a> {
    relation: &'a Relation,
}

impl<'a> ResourceModel<'a> {
    pub fn new(relation: &'a Relation) -> Self {
        ResourceModel { relation }
    }

    pub fn relation(&self) -> &Relation {
        self.relation
    }

    /// All rows ordered by id; possibly empty.
    pub async fn get_all<'c, E: PgExecutor<'c>>(&self, executor: E) -> Result<Vec<Record>, AppError> {
        let q = select_all(self.relation);
        let rows = bind_query(&q).fetch_all(executor).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    /// `None` when no row has this id.
    pub async fn get_by_id<'c, E: PgExecutor<'c>>(&self, executor: E, id: i64) -> Result<Option<Record>, AppError> {
        let q = select_by_id(self.relation, id);
        let row = bind_query(&q).fetch_optional(executor).await?;
        Ok(row.as_ref().map(row_to_record))
    }

    /// Insert one record and return its generated id.
    pub async fn create<'c, E: PgExecutor<'c>>(&self, executor: E, record: &Record) -> Result<i64, AppError> {
        self.check_record(record)?;
        let q = insert(self.relation, record);
        let row = bind_query(&q).fetch_one(executor).await?;
        let id: i64 = row.try_get(ID_COLUMN)?;
        tracing::debug!(table = %self.relation.name, id, "row created");
        Ok(id)
    }

    /// One multi-row INSERT. Returns the number of rows written.
    pub async fn create_bulk<'c, E: PgExecutor<'c>>(&self, executor: E, records: &[Record]) -> Result<u64, AppError> {
        let columns = uniform_columns(records)?;
        check_columns(self.relation, &columns)?;
        check_bulk_size(records.len(), columns.len())?;
        let q = insert_bulk(self.relation, &columns, records);
        let done = bind_query(&q).execute(executor).await?;
        tracing::debug!(table = %self.relation.name, rows = done.rows_affected(), "bulk insert");
        Ok(done.rows_affected())
    }

    /// `false` when no row has this id.
    pub async fn update<'c, E: PgExecutor<'c>>(&self, executor: E, id: i64, record: &Record) -> Result<bool, AppError> {
        self.check_record(record)?;
        let q = update(self.relation, id, record);
        let done = bind_query(&q).execute(executor).await?;
        Ok(done.rows_affected() > 0)
    }

    /// `false` when no row has this id.
    pub async fn delete<'c, E: PgExecutor<'c>>(&self, executor: E, id: i64) -> Result<bool, AppError> {
        let q = delete(self.relation, id);
        let done = bind_query(&q).execute(executor).await?;
        Ok(done.rows_affected() > 0)
    }

    fn check_record(&self, record: &Record) -> Result<(), AppError> {
        if record.is_empty() {
            return Err(AppError::Validation("Payload must not be empty".into()));
        }
        check_columns(self.relation, record.keys())
    }
}
