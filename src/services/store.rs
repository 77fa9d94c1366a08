use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        hike::{Hike, NewHike},
        quote::Quote,
        review::{NewReview, Review},
        user::User,
    },
};

/// Front-end over the document collections: users, hikes, bookmarks,
/// reviews, quotes. All operations are single statements; the bookmark
/// set-add and set-remove are the atomic membership primitives the
/// toggle workflow relies on.
#[derive(Clone)]
pub struct HikeStore {
    db: DbPool,
    quote_events: broadcast::Sender<Quote>,
}

impl HikeStore {
    pub fn new(db: DbPool) -> Self {
        let (quote_events, _) = broadcast::channel(16);
        Self { db, quote_events }
    }

    pub async fn get_user(&self, uuid: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE uuid = ?1")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    /// Bookmark snapshot for one user, in insertion order. Captured once
    /// per dashboard load.
    pub async fn bookmarks_for(&self, user_uuid: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT hike_id FROM bookmarks WHERE user_uuid = ?1 ORDER BY created_at",
        )
        .bind(user_uuid)
        .fetch_all(&self.db)
        .await?;
        Ok(ids)
    }

    /// Atomic set-add: inserting an already-present member is a no-op,
    /// so the set never holds duplicates.
    pub async fn add_bookmark(&self, user_uuid: &str, hike_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO bookmarks (user_uuid, hike_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(user_uuid)
        .bind(hike_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Atomic set-remove: removing an absent member is a no-op.
    pub async fn remove_bookmark(&self, user_uuid: &str, hike_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bookmarks WHERE user_uuid = ?1 AND hike_id = ?2")
            .bind(user_uuid)
            .bind(hike_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Collection scan. No sort key is requested; callers must not rely
    /// on ordering.
    pub async fn list_hikes(&self) -> Result<Vec<Hike>, AppError> {
        let hikes = sqlx::query_as::<_, Hike>("SELECT * FROM hikes")
            .fetch_all(&self.db)
            .await?;
        Ok(hikes)
    }

    pub async fn get_hike(&self, id: &str) -> Result<Option<Hike>, AppError> {
        let hike = sqlx::query_as::<_, Hike>("SELECT * FROM hikes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(hike)
    }

    pub async fn count_hikes(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hikes")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn add_hike(&self, hike: NewHike) -> Result<Hike, AppError> {
        let id = Uuid::new_v4().to_string();
        let last_updated = Utc::now();
        sqlx::query(
            "INSERT INTO hikes (id, code, name, city, level, details, length, hike_time, lat, lng, last_updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&id)
        .bind(&hike.code)
        .bind(&hike.name)
        .bind(&hike.city)
        .bind(&hike.level)
        .bind(&hike.details)
        .bind(hike.length)
        .bind(hike.hike_time)
        .bind(hike.lat)
        .bind(hike.lng)
        .bind(last_updated)
        .execute(&self.db)
        .await?;
        Ok(Hike {
            id,
            code: hike.code,
            name: hike.name,
            city: hike.city,
            level: hike.level,
            details: hike.details,
            length: hike.length,
            hike_time: hike.hike_time,
            lat: hike.lat,
            lng: hike.lng,
            last_updated,
        })
    }

    /// Equality-predicate query over the reviews collection.
    pub async fn reviews_for(&self, hike_id: &str) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE hike_id = ?1")
            .bind(hike_id)
            .fetch_all(&self.db)
            .await?;
        Ok(reviews)
    }

    /// Creates a review document; id and creation timestamp are assigned
    /// here, not by the caller.
    pub async fn add_review(&self, review: NewReview) -> Result<Review, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO reviews (id, hike_id, title, level, season, description, flooded, scrambled, rating, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&id)
        .bind(&review.hike_id)
        .bind(&review.title)
        .bind(&review.level)
        .bind(&review.season)
        .bind(&review.description)
        .bind(&review.flooded)
        .bind(&review.scrambled)
        .bind(review.rating)
        .bind(created_at)
        .execute(&self.db)
        .await?;
        Ok(Review {
            id,
            hike_id: review.hike_id,
            title: review.title,
            level: review.level,
            season: review.season,
            description: review.description,
            flooded: review.flooded,
            scrambled: review.scrambled,
            rating: review.rating,
            created_at,
        })
    }

    pub async fn quote_for(&self, day: &str) -> Result<Option<Quote>, AppError> {
        let quote = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE day = ?1")
            .bind(day)
            .fetch_optional(&self.db)
            .await?;
        Ok(quote)
    }

    pub async fn set_quote(&self, day: &str, text: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO quotes (day, quote) VALUES (?1, ?2) \
             ON CONFLICT(day) DO UPDATE SET quote = excluded.quote",
        )
        .bind(day)
        .bind(text)
        .execute(&self.db)
        .await?;
        // Lagging or absent subscribers are fine; the write stands alone.
        let _ = self.quote_events.send(Quote {
            day: day.to_string(),
            quote: text.to_string(),
        });
        Ok(())
    }

    /// Live-update subscription over quote writes. Each write through
    /// [`Self::set_quote`] is broadcast to every open receiver.
    pub fn subscribe_quotes(&self) -> broadcast::Receiver<Quote> {
        self.quote_events.subscribe()
    }
}
