//! Runtime configuration read from environment variables.

use crate::config::is_valid_identifier;
use crate::error::ConfigError;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_VIEWS: &[&str] = &["LatestDeviceReadings"];
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// Schema whose tables and views are exposed.
    pub schema: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Sent as the `statement_timeout` session option; zero disables it.
    pub statement_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: String::new(),
            name: "atmos".into(),
            schema: "public".into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_millis(15_000),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub database: DatabaseConfig,
    /// Views that may be read through `/api/views/{name}`.
    pub views: Vec<String>,
    /// When set, only these tables are exposed; otherwise every catalogued base table.
    pub resources: Option<HashSet<String>>,
    pub cors_allowed_origins: Vec<String>,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub body_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            views: DEFAULT_VIEWS.iter().map(|v| v.to_string()).collect(),
            resources: None,
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.into()],
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            request_timeout: Duration::from_secs(30),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or empty keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = ApiConfig::default();
        let db_defaults = defaults.database;

        let schema = get("DB_SCHEMA").unwrap_or(db_defaults.schema);
        if !is_valid_identifier(&schema) {
            return Err(ConfigError::InvalidIdentifier {
                var: "DB_SCHEMA",
                value: schema,
            });
        }

        let database = DatabaseConfig {
            host: get("DB_HOST").unwrap_or(db_defaults.host),
            port: parse_or("DB_PORT", get("DB_PORT"), db_defaults.port)?,
            user: get("DB_USER").unwrap_or(db_defaults.user),
            // An empty password is a legitimate value.
            password: lookup("DB_PASS").unwrap_or(db_defaults.password),
            name: get("DB_NAME").unwrap_or(db_defaults.name),
            schema,
            max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), db_defaults.max_connections)?,
            acquire_timeout: Duration::from_secs(parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                db_defaults.acquire_timeout.as_secs(),
            )?),
            statement_timeout: Duration::from_millis(parse_or(
                "DB_STATEMENT_TIMEOUT_MS",
                get("DB_STATEMENT_TIMEOUT_MS"),
                db_defaults.statement_timeout.as_millis() as u64,
            )?),
        };

        let views = match get("API_VIEWS") {
            Some(raw) => identifier_list("API_VIEWS", &raw)?,
            None => defaults.views,
        };
        let resources = match get("API_RESOURCES") {
            Some(raw) => Some(identifier_list("API_RESOURCES", &raw)?.into_iter().collect()),
            None => None,
        };
        let cors_allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(raw) => split_list(&raw),
            None => defaults.cors_allowed_origins,
        };

        Ok(ApiConfig {
            database,
            views,
            resources,
            cors_allowed_origins,
            bind_addr: parse_or("BIND_ADDR", get("BIND_ADDR"), defaults.bind_addr)?,
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )?),
            body_limit: defaults.body_limit,
        })
    }

    pub fn is_view_allowed(&self, name: &str) -> bool {
        self.views.iter().any(|v| v == name)
    }

    pub fn is_resource_allowed(&self, name: &str) -> bool {
        self.resources.as_ref().map_or(true, |set| set.contains(name))
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn identifier_list(var: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let items = split_list(raw);
    if let Some(bad) = items.iter().find(|s| !is_valid_identifier(s)) {
        return Err(ConfigError::InvalidIdentifier {
            var,
            value: bad.clone(),
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "atmos");
        assert_eq!(config.database.schema, "public");
        assert_eq!(config.views, vec!["LatestDeviceReadings".to_string()]);
        assert!(config.resources.is_none());
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DB_HOST", "mariadb"),
            ("DB_PORT", "6543"),
            ("DB_USER", "atmos"),
            ("DB_PASS", "secret"),
            ("DB_NAME", "sensors"),
            ("API_VIEWS", "LatestDeviceReadings, DailyAverages"),
            ("API_RESOURCES", "device,reading"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test,http://b.test"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_STATEMENT_TIMEOUT_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.database.host, "mariadb");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.password, "secret");
        assert_eq!(config.database.name, "sensors");
        assert_eq!(config.views.len(), 2);
        assert!(config.is_view_allowed("DailyAverages"));
        assert!(config.is_resource_allowed("device"));
        assert!(!config.is_resource_allowed("setting"));
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.database.statement_timeout.is_zero());
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("DB_PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "DB_PORT", .. }));
    }

    #[test]
    fn rejects_injected_view_name() {
        let err = config_from(&[("API_VIEWS", "ok_view,bad view")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdentifier { var: "API_VIEWS", .. }));
    }

    #[test]
    fn rejects_bad_schema() {
        let err = config_from(&[("DB_SCHEMA", "public; drop")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdentifier { var: "DB_SCHEMA", .. }));
    }
}
