//! Schema catalog: tables and views introspected from `information_schema`.
//! The closed set of identifiers that may appear in generated SQL.

use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// Primary identifier column every exposed table is expected to carry.
pub const ID_COLUMN: &str = "id";

/// Types `row_to_record` decodes directly; everything else is selected as text.
const NATIVE_TYPES: &[&str] = &[
    "int2", "int4", "int8", "float4", "float8", "bool", "text", "varchar", "bpchar", "name",
    "json", "jsonb", "uuid", "timestamptz", "timestamp", "date",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    View,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub udt_schema: String,
    /// PostgreSQL type name (e.g. "int4", "numeric", "timestamptz").
    pub udt_name: String,
}

impl ColumnInfo {
    pub fn new(name: &str, udt_name: &str) -> Self {
        ColumnInfo {
            name: name.into(),
            udt_schema: "pg_catalog".into(),
            udt_name: udt_name.into(),
        }
    }

    pub fn decodes_natively(&self) -> bool {
        self.udt_schema == "pg_catalog" && NATIVE_TYPES.contains(&self.udt_name.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct Relation {
    pub schema: String,
    pub name: String,
    pub kind: RelationKind,
    pub columns: Vec<ColumnInfo>,
}

impl Relation {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_id(&self) -> bool {
        self.column(ID_COLUMN).is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    relations: HashMap<String, Relation>,
}

impl Catalog {
    pub fn from_relations(relations: impl IntoIterator<Item = Relation>) -> Self {
        Catalog {
            relations: relations.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }

    /// Read every table and view of `schema` with its columns in ordinal order.
    pub async fn load(pool: &PgPool, schema: &str) -> Result<Self, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT c.table_name::text AS table_name,
                   t.table_type::text AS table_type,
                   c.column_name::text AS column_name,
                   c.udt_schema::text AS udt_schema,
                   c.udt_name::text AS udt_name
            FROM information_schema.columns c
            JOIN information_schema.tables t
              ON t.table_schema = c.table_schema AND t.table_name = c.table_name
            WHERE c.table_schema = $1
            ORDER BY c.table_name, c.ordinal_position
            "#,
        )
        .bind(schema)
        .fetch_all(pool)
        .await?;

        let mut relations: HashMap<String, Relation> = HashMap::new();
        for row in rows {
            let table_name: String = row.try_get("table_name")?;
            let table_type: String = row.try_get("table_type")?;
            let kind = match table_type.as_str() {
                "BASE TABLE" => RelationKind::Table,
                "VIEW" => RelationKind::View,
                _ => continue,
            };
            let column = ColumnInfo {
                name: row.try_get("column_name")?,
                udt_schema: row.try_get("udt_schema")?,
                udt_name: row.try_get("udt_name")?,
            };
            relations
                .entry(table_name.clone())
                .or_insert_with(|| Relation {
                    schema: schema.to_string(),
                    name: table_name,
                    kind,
                    columns: Vec::new(),
                })
                .columns
                .push(column);
        }
        for rel in relations.values().filter(|r| r.kind == RelationKind::Table && !r.has_id()) {
            tracing::warn!(table = %rel.name, "table has no '{}' column; not exposed", ID_COLUMN);
        }
        tracing::info!(schema = %schema, relations = relations.len(), "schema catalog loaded");
        Ok(Catalog { relations })
    }

    /// Exact name first; unquoted identifiers are folded to lower case by PostgreSQL.
    fn lookup(&self, name: &str, kind: RelationKind) -> Option<&Relation> {
        self.relations
            .get(name)
            .or_else(|| self.relations.get(&name.to_lowercase()))
            .filter(|r| r.kind == kind)
    }

    /// Base table with an `id` column.
    pub fn table(&self, name: &str) -> Option<&Relation> {
        self.lookup(name, RelationKind::Table).filter(|r| r.has_id())
    }

    pub fn view(&self, name: &str) -> Option<&Relation> {
        self.lookup(name, RelationKind::View)
    }
}
