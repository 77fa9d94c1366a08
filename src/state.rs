use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{bookmarks::BookmarkSync, config::AppConfig, db::DbPool, services::store::HikeStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub store: HikeStore,
    pub bookmarks: BookmarkSync,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, store: HikeStore) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        let bookmarks = BookmarkSync::new(store.clone());
        Self {
            config,
            db,
            store,
            bookmarks,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
