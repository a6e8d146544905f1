use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub query_timeout: Duration,
    pub db_max_connections: u32,
    pub db_connect_attempts: u32,
    /// Year assumed for dates written without one. Defaults to the current UTC year.
    pub current_year: Option<i32>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            query_timeout: Duration::from_secs(parse_env("QUERY_TIMEOUT_SECS", 10)?),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            db_connect_attempts: parse_env("DB_CONNECT_ATTEMPTS", 30)?,
            current_year: optional_env("CURRENT_YEAR")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    Ok(optional_env(key)?.unwrap_or(default))
}

fn optional_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .ok()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; each test uses its own keys.

    #[test]
    fn test_parse_env_falls_back_to_default() {
        std::env::remove_var("VIDEOSTATS_TEST_UNSET");
        assert_eq!(parse_env("VIDEOSTATS_TEST_UNSET", 42u32).unwrap(), 42);
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("VIDEOSTATS_TEST_PORT", " 9090 ");
        assert_eq!(parse_env("VIDEOSTATS_TEST_PORT", 8080u16).unwrap(), 9090);
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        std::env::set_var("VIDEOSTATS_TEST_BAD", "soon");
        let err = parse_env("VIDEOSTATS_TEST_BAD", 10u64).unwrap_err();
        assert!(err.to_string().contains("VIDEOSTATS_TEST_BAD"));
    }

    #[test]
    fn test_missing_required_var_is_an_error() {
        std::env::remove_var("VIDEOSTATS_TEST_REQUIRED");
        assert!(require_env("VIDEOSTATS_TEST_REQUIRED").is_err());
    }
}
