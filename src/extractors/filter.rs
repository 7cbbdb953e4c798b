//! Optional `device_id` view filter.

use crate::config::parse_numeric_id;
use crate::error::AppError;
use crate::service::FILTER_COLUMN;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

/// Last `device_id` in the query string, kept only when it is all digits.
/// Repeated keys are not an error.
#[derive(Debug, Default, PartialEq)]
pub struct DeviceFilter(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for DeviceFilter
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(DeviceFilter(last_numeric(&pairs, FILTER_COLUMN)))
    }
}

fn last_numeric(pairs: &[(String, String)], key: &str) -> Option<i64> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| parse_numeric_id(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn last_value_wins() {
        assert_eq!(last_numeric(&pairs(&[("device_id", "1"), ("device_id", "2")]), "device_id"), Some(2));
    }

    #[test]
    fn non_numeric_last_value_is_ignored() {
        assert_eq!(last_numeric(&pairs(&[("device_id", "1"), ("device_id", "x")]), "device_id"), None);
        assert_eq!(last_numeric(&pairs(&[("other", "1")]), "device_id"), None);
    }

    #[tokio::test]
    async fn repeated_keys_are_accepted() {
        let (mut parts, _) = axum::http::Request::builder()
            .uri("/api/views/LatestDeviceReadings?device_id=4&device_id=9")
            .body(())
            .unwrap()
            .into_parts();
        let filter = DeviceFilter::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(filter, DeviceFilter(Some(9)));
    }
}
