use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: String,
    pub hike_id: String,
    pub title: Option<String>,
    pub level: Option<String>,
    pub season: Option<String>,
    pub description: Option<String>,
    pub flooded: Option<String>,
    pub scrambled: Option<String>,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn title_text(&self) -> &str {
        non_empty(&self.title).unwrap_or("(No title)")
    }

    pub fn level_text(&self) -> &str {
        non_empty(&self.level).unwrap_or("(Not specified)")
    }

    pub fn season_text(&self) -> &str {
        non_empty(&self.season).unwrap_or("(Not specified)")
    }

    pub fn flooded_text(&self) -> &str {
        non_empty(&self.flooded).unwrap_or("(unknown)")
    }

    pub fn scrambled_text(&self) -> &str {
        non_empty(&self.scrambled).unwrap_or("(unknown)")
    }

    pub fn description_text(&self) -> &str {
        non_empty(&self.description).unwrap_or("")
    }
}

/// Review fields submitted through the form; id and created-at are
/// assigned by the store on insert.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub hike_id: String,
    pub title: Option<String>,
    pub level: Option<String>,
    pub season: Option<String>,
    pub description: Option<String>,
    pub flooded: Option<String>,
    pub scrambled: Option<String>,
    pub rating: i64,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}
