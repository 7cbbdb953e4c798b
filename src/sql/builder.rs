//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a catalogued relation.

use crate::config::{ColumnInfo, Relation, ID_COLUMN};
use crate::sql::Record;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from the catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(rel: &Relation) -> String {
    format!("{}.{}", quoted(&rel.schema), quoted(&rel.name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a text-bound value and return its placeholder cast to the column type.
    fn placeholder(&mut self, v: Value, column: Option<&ColumnInfo>) -> String {
        let n = self.push_param(v);
        match column {
            Some(c) => format!("${}::{}.{}", n, quoted(&c.udt_schema), quoted(&c.udt_name)),
            None => format!("${}", n),
        }
    }
}

/// SELECT list: each column as-is, except types `row_to_record` cannot decode, selected as text.
fn select_column_list(rel: &Relation) -> String {
    if rel.columns.is_empty() {
        return "*".into();
    }
    rel.columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            if c.decodes_natively() {
                q
            } else {
                format!("{}::text AS {}", q, q)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_placeholder(q: &mut QueryBuf, rel: &Relation, id: i64) -> String {
    q.placeholder(Value::from(id), rel.column(ID_COLUMN))
}

/// SELECT every row ordered by id.
pub fn select_all(rel: &Relation) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_column_list(rel),
        qualified_table(rel),
        quoted(ID_COLUMN)
    );
    q
}

/// SELECT by primary identifier.
pub fn select_by_id(rel: &Relation, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = id_placeholder(&mut q, rel, id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(rel),
        qualified_table(rel),
        quoted(ID_COLUMN),
        ph
    );
    q
}

/// SELECT from a view with an optional equality filter.
pub fn select_view(rel: &Relation, filter: Option<(&ColumnInfo, i64)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = match filter {
        Some((col, value)) => {
            let ph = q.placeholder(Value::from(value), Some(col));
            format!(" WHERE {} = {}", quoted(&col.name), ph)
        }
        None => String::new(),
    };
    q.sql = format!(
        "SELECT {} FROM {}{}",
        select_column_list(rel),
        qualified_table(rel),
        where_clause
    );
    q
}

/// INSERT one record; columns in record key order. Returns the generated id.
pub fn insert(rel: &Relation, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    for (name, val) in record {
        placeholders.push(q.placeholder(val.clone(), rel.column(name)));
        cols.push(quoted(name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}::int8 AS {}",
        qualified_table(rel),
        cols.join(", "),
        placeholders.join(", "),
        quoted(ID_COLUMN),
        quoted(ID_COLUMN)
    );
    q
}

/// Multi-row INSERT: one tuple per record, values taken in `columns` order.
/// Params are flattened row by row to match tuple order.
pub fn insert_bulk(rel: &Relation, columns: &[String], records: &[Record]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let infos: Vec<Option<&ColumnInfo>> = columns.iter().map(|c| rel.column(c)).collect();
    let mut tuples = Vec::with_capacity(records.len());
    for record in records {
        let phs: Vec<String> = columns
            .iter()
            .zip(&infos)
            .map(|(col, info)| {
                let val = record.get(col).cloned().unwrap_or(Value::Null);
                q.placeholder(val, *info)
            })
            .collect();
        tuples.push(format!("({})", phs.join(", ")));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified_table(rel),
        columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", "),
        tuples.join(", ")
    );
    q
}

/// UPDATE by id: one SET clause per record key.
pub fn update(rel: &Relation, id: i64, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let sets: Vec<String> = record
        .iter()
        .map(|(name, val)| format!("{} = {}", quoted(name), q.placeholder(val.clone(), rel.column(name))))
        .collect();
    let id_ph = id_placeholder(&mut q, rel, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        qualified_table(rel),
        sets.join(", "),
        quoted(ID_COLUMN),
        id_ph
    );
    q
}

/// DELETE by id.
pub fn delete(rel: &Relation, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = id_placeholder(&mut q, rel, id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified_table(rel),
        quoted(ID_COLUMN),
        ph
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelationKind;
    use serde_json::json;

    fn sensordata() -> Relation {
        Relation {
            schema: "public".into(),
            name: "sensordata".into(),
            kind: RelationKind::Table,
            columns: vec![
                ColumnInfo::new("id", "int4"),
                ColumnInfo::new("reading_id", "int4"),
                ColumnInfo::new("sensor_id", "int4"),
                ColumnInfo::new("value", "numeric"),
            ],
        }
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn select_all_casts_undecodable_columns() {
        let q = select_all(&sensordata());
        assert_eq!(
            q.sql,
            r#"SELECT "id", "reading_id", "sensor_id", "value"::text AS "value" FROM "public"."sensordata" ORDER BY "id""#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn select_by_id_binds_id() {
        let q = select_by_id(&sensordata(), 7);
        assert!(q.sql.ends_with(r#"WHERE "id" = $1::"pg_catalog"."int4""#));
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn insert_keeps_record_order() {
        let q = insert(&sensordata(), &record(json!({"sensor_id": 1, "value": 21.5})));
        assert_eq!(
            q.sql,
            r#"INSERT INTO "public"."sensordata" ("sensor_id", "value") VALUES ($1::"pg_catalog"."int4", $2::"pg_catalog"."numeric") RETURNING "id"::int8 AS "id""#
        );
        assert_eq!(q.params, vec![json!(1), json!(21.5)]);
    }

    #[test]
    fn bulk_insert_flattens_in_tuple_order() {
        let columns = vec!["sensor_id".to_string(), "value".to_string()];
        let records = vec![
            record(json!({"sensor_id": 1, "value": 21.5})),
            record(json!({"value": 55, "sensor_id": 2})),
        ];
        let q = insert_bulk(&sensordata(), &columns, &records);
        assert!(q.sql.ends_with(
            r#"VALUES ($1::"pg_catalog"."int4", $2::"pg_catalog"."numeric"), ($3::"pg_catalog"."int4", $4::"pg_catalog"."numeric")"#
        ));
        assert_eq!(q.params, vec![json!(1), json!(21.5), json!(2), json!(55)]);
    }

    #[test]
    fn update_binds_id_last() {
        let q = update(&sensordata(), 9, &record(json!({"value": "3.3"})));
        assert_eq!(
            q.sql,
            r#"UPDATE "public"."sensordata" SET "value" = $1::"pg_catalog"."numeric" WHERE "id" = $2::"pg_catalog"."int4""#
        );
        assert_eq!(q.params, vec![json!("3.3"), json!(9)]);
    }

    #[test]
    fn delete_by_id() {
        let q = delete(&sensordata(), 4);
        assert_eq!(
            q.sql,
            r#"DELETE FROM "public"."sensordata" WHERE "id" = $1::"pg_catalog"."int4""#
        );
        assert_eq!(q.params, vec![json!(4)]);
    }

    #[test]
    fn view_filter_is_parameterized() {
        let view = Relation {
            schema: "public".into(),
            name: "LatestDeviceReadings".into(),
            kind: RelationKind::View,
            columns: vec![ColumnInfo::new("device_id", "int4"), ColumnInfo::new("value", "numeric")],
        };
        let unfiltered = select_view(&view, None);
        assert_eq!(
            unfiltered.sql,
            r#"SELECT "device_id", "value"::text AS "value" FROM "public"."LatestDeviceReadings""#
        );
        let col = view.column("device_id").unwrap();
        let filtered = select_view(&view, Some((col, 3)));
        assert!(filtered.sql.ends_with(r#"WHERE "device_id" = $1::"pg_catalog"."int4""#));
        assert_eq!(filtered.params, vec![json!(3)]);
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted(r#"we"ird"#), r#""we""ird""#);
    }
}
