use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One hike document. Read-only reference data once seeded.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hike {
    pub id: String,
    /// Short code that resolves the card image, e.g. "BBY01".
    pub code: String,
    pub name: String,
    pub city: String,
    pub level: String,
    pub details: Option<String>,
    pub length: f64,
    /// Estimated duration in minutes.
    pub hike_time: i64,
    pub lat: f64,
    pub lng: f64,
    pub last_updated: DateTime<Utc>,
}

/// Fields for a hike about to be inserted; the store assigns id and
/// last-updated timestamp.
#[derive(Debug, Clone)]
pub struct NewHike {
    pub code: String,
    pub name: String,
    pub city: String,
    pub level: String,
    pub details: Option<String>,
    pub length: f64,
    pub hike_time: i64,
    pub lat: f64,
    pub lng: f64,
}
