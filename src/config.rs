// Runtime configuration loaded from the environment (.env supported via dotenv)

use std::str::FromStr;

/// Default public endpoint for GBP-based exchange rates
pub const DEFAULT_CURRENCY_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/GBP";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub db_max_connections: u32,
    pub currency_api_url: String,
    pub login_rate_per_second: u64,
    pub login_burst: u32,
}

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Split out from `from_env` so tests do not have to mutate the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: parse_or(&lookup, "JWT_EXPIRATION_HOURS", 24)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            currency_api_url: lookup("CURRENCY_API_URL")
                .unwrap_or_else(|| DEFAULT_CURRENCY_API_URL.to_string()),
            login_rate_per_second: parse_or(&lookup, "LOGIN_RATE_PER_SECOND", 2)?,
            login_burst: parse_or(&lookup, "LOGIN_BURST", 5)?,
        })
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.currency_api_url, DEFAULT_CURRENCY_API_URL);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_database_url() {
        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "secret")]));
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_blank_jwt_secret_is_missing() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "   "),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]));
        match result {
            Err(ConfigError::Invalid { name, value }) => {
                assert_eq!(name, "PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("Expected invalid PORT, got {:?}", other),
        }
    }
}
