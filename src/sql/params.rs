//! Values cross the storage boundary as text; the placeholder cast picks the column type.

use crate::sql::QueryBuf;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// Text form of a JSON value. `None` binds SQL NULL.
pub fn text_param(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

/// Prepare `q` with every param bound in order.
pub fn bind_query(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    q.params
        .iter()
        .fold(sqlx::query(&q.sql), |query, p| query.bind(text_param(p)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_become_text() {
        assert_eq!(text_param(&json!("21.5")), Some("21.5".into()));
        assert_eq!(text_param(&json!(21.5)), Some("21.5".into()));
        assert_eq!(text_param(&json!(3)), Some("3".into()));
        assert_eq!(text_param(&json!(true)), Some("true".into()));
        assert_eq!(text_param(&Value::Null), None);
    }

    #[test]
    fn nested_values_become_json_text() {
        assert_eq!(text_param(&json!({"a": [1, 2]})), Some(r#"{"a":[1,2]}"#.into()));
    }
}
