//! Card projection: turns hike and review documents into the per-render
//! view structs the dashboard and detail templates consume.

use std::collections::HashSet;

use chrono::{DateTime, Local, Utc};

use crate::{
    bookmarks::BookmarkIcon,
    models::{hike::Hike, review::Review},
};

pub const STAR_COUNT: usize = 5;

/// One dashboard card. Rebuilt on every dashboard load, never persisted.
#[derive(Debug, Clone)]
pub struct HikeCard {
    pub hike_id: String,
    pub title: String,
    pub description: String,
    pub length_text: String,
    pub image: String,
    pub saved: bool,
    pub glyph: &'static str,
}

/// Build one card per hike, in the order the query returned them. The
/// bookmark snapshot is the dashboard-load one; live membership is not
/// re-read here.
pub fn hike_cards(hikes: Vec<Hike>, bookmarks: &[String]) -> Vec<HikeCard> {
    let bookmarked: HashSet<&str> = bookmarks.iter().map(String::as_str).collect();
    hikes
        .into_iter()
        .map(|hike| {
            let saved = bookmarked.contains(hike.id.as_str());
            HikeCard {
                image: image_path(&hike.code),
                description: description_for(&hike),
                length_text: hike.length.to_string(),
                title: hike.name,
                hike_id: hike.id,
                saved,
                glyph: BookmarkIcon::new(saved).glyph(),
            }
        })
        .collect()
}

/// Image asset path, derived solely from the hike's short code. No
/// existence check.
pub fn image_path(code: &str) -> String {
    format!("./images/{code}.jpg")
}

fn description_for(hike: &Hike) -> String {
    hike.details
        .as_deref()
        .filter(|details| !details.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Located in {}.", hike.city))
}

/// One rendered review.
#[derive(Debug, Clone)]
pub struct ReviewCard {
    pub title: String,
    pub time: String,
    pub level: String,
    pub season: String,
    pub scrambled: String,
    pub flooded: String,
    pub description: String,
    /// Exactly five glyph names, filled stars first.
    pub stars: Vec<&'static str>,
}

pub fn review_cards(reviews: Vec<Review>) -> Vec<ReviewCard> {
    reviews.into_iter().map(review_card).collect()
}

fn review_card(review: Review) -> ReviewCard {
    ReviewCard {
        title: review.title_text().to_string(),
        time: format_timestamp(review.created_at),
        level: format!("Level: {}", review.level_text()),
        season: format!("Season: {}", review.season_text()),
        scrambled: format!("Scrambled: {}", review.scrambled_text()),
        flooded: format!("Flooded: {}", review.flooded_text()),
        description: format!("Description: {}", review.description_text()),
        stars: star_row(review.rating),
    }
}

/// Filled and outlined star glyphs summing to [`STAR_COUNT`];
/// out-of-range ratings clamp.
pub fn star_row(rating: i64) -> Vec<&'static str> {
    let filled = rating.clamp(0, STAR_COUNT as i64) as usize;
    (0..STAR_COUNT)
        .map(|i| if i < filled { "star" } else { "star_outline" })
        .collect()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
