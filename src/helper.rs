use chrono::{DateTime, SecondsFormat, Utc};
use dotenv::dotenv;
use std::env;
use uuid::Uuid;

use crate::errors::AppError;

pub fn get_env_value_by_key(key: &str) -> Result<String, AppError> {
    dotenv().ok();

    env::var(key).map_err(|_| AppError::NotFound(format!("{} in env", key)))
}

pub fn env_value_or(key: &str, default: &str) -> String {
    get_env_value_by_key(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Fresh record identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// RFC 3339 with as many fractional digits as needed, so parsing the text
/// back yields the same instant.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
