use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Quote of the day, keyed by lowercase weekday name ("monday", ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub day: String,
    pub quote: String,
}

/// Lowercase weekday name for today in the server's local timezone,
/// the key the quotes collection uses.
pub fn today_key() -> String {
    Local::now().format("%A").to_string().to_lowercase()
}
