use std::env;
use std::str::FromStr;

use super::types::{ConfigError, Environment};

const LOCAL_FRONTENDS: [&str; 3] =
    ["http://localhost:5173", "http://localhost:3000", "http://localhost:8080"];

/// Trimmed value of `key`; blank values count as unset.
pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn env_flag(key: &str) -> bool {
    env_optional(key).is_some_and(|value| parse_bool(&value))
}

/// Reads `key` as a number, falling back to `default` when unset.
pub(super) fn env_number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_optional(key) {
        Some(value) => parse_number(key, value),
        None => Ok(default),
    }
}

pub(super) fn parse_number<T: FromStr>(field: &'static str, value: String) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidValue { field, value })
}

/// Accepts a JSON array or a comma separated list; empty input keeps the local defaults.
pub(super) fn parse_cors_origins(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let raw = value.unwrap_or_default();
    let raw = raw.trim();

    let origins: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw)
            .map_err(|_| ConfigError::InvalidCors(raw.to_string()))?
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    } else {
        raw.split(',').map(str::trim).filter(|origin| !origin.is_empty()).map(String::from).collect()
    };

    if origins.is_empty() {
        return Ok(LOCAL_FRONTENDS.iter().map(|origin| origin.to_string()).collect());
    }
    Ok(origins)
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    let value = value.map(|value| value.to_ascii_lowercase()).unwrap_or_default();
    match value.as_str() {
        "production" | "prod" => Environment::Production,
        "staging" => Environment::Staging,
        "test" | "testing" => Environment::Test,
        _ => Environment::Development,
    }
}
