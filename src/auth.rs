use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{session::Session, user::User},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "switchback_session";

const SESSION_LIFETIME_DAYS: i64 = 30;

/// Resolved identity: stable identifier plus optional display name and
/// contact address.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uuid: String,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    fn from_user(user: User) -> Self {
        Self {
            uuid: user.uuid,
            username: user.username,
            display_name: user.display_name,
            email: Some(user.email),
        }
    }

    /// Name for the dashboard greeting: display name, then username,
    /// then contact address.
    pub fn greeting_name(&self) -> &str {
        if let Some(name) = self.display_name.as_deref() {
            if !name.trim().is_empty() {
                return name;
            }
        }
        if !self.username.is_empty() {
            return &self.username;
        }
        self.email.as_deref().unwrap_or("")
    }
}

/// Outcome of the one-shot session handshake.
#[derive(Debug, Clone)]
pub enum SessionState {
    SignedIn(Identity),
    SignedOut,
}

#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionState);

impl CurrentUser {
    pub fn signed_in(&self) -> Option<&Identity> {
        match &self.0 {
            SessionState::SignedIn(identity) => Some(identity),
            SessionState::SignedOut => None,
        }
    }

    pub fn require_user(&self) -> Result<&Identity, AppError> {
        self.signed_in().ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(err) => match err {},
        };
        Ok(Self(resolve_session(state, &jar).await?))
    }
}

/// One-shot handshake: resolves the session cookie to `SignedIn` with
/// the user's identity, or `SignedOut`.
pub async fn resolve_session(
    state: &AppState,
    jar: &PrivateCookieJar,
) -> Result<SessionState, AppError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(SessionState::SignedOut);
    };

    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?1")
        .bind(cookie.value())
        .fetch_optional(&state.db)
        .await?;
    let Some(session) = session else {
        return Ok(SessionState::SignedOut);
    };
    if let Some(expires_at) = session.expires_at {
        if expires_at < Utc::now() {
            destroy_session(state, &session.id).await?;
            return Ok(SessionState::SignedOut);
        }
    }

    match state.store.get_user(&session.user_uuid).await? {
        Some(user) => Ok(SessionState::SignedIn(Identity::from_user(user))),
        None => Ok(SessionState::SignedOut),
    }
}

pub async fn register_user(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Identity, AppError> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username, email and password are all required.".into(),
        ));
    }

    let taken: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2")
            .bind(username)
            .bind(email)
            .fetch_one(&state.db)
            .await?;
    if taken > 0 {
        return Err(AppError::BadRequest(
            "That username or email is already registered.".into(),
        ));
    }

    let uuid = Uuid::new_v4().to_string();
    let password_hash = hash_password(password)?;
    sqlx::query(
        "INSERT INTO users (uuid, username, email, password_hash, display_name, created_at) \
         VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
    )
    .bind(&uuid)
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    Ok(Identity {
        uuid,
        username: username.to_string(),
        display_name: None,
        email: Some(email.to_string()),
    })
}

pub async fn authenticate_user(
    state: &AppState,
    identifier: &str,
    password: &str,
) -> Result<Identity, AppError> {
    let user =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1 OR email = ?1")
            .bind(identifier.trim())
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    sqlx::query("UPDATE users SET last_login_at = ?1 WHERE uuid = ?2")
        .bind(Utc::now())
        .bind(&user.uuid)
        .execute(&state.db)
        .await?;

    Ok(Identity::from_user(user))
}

pub async fn create_session(state: &AppState, user_uuid: &str) -> Result<String, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    sqlx::query("INSERT INTO sessions (id, user_uuid, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&id)
        .bind(user_uuid)
        .bind(now)
        .bind(now + Duration::days(SESSION_LIFETIME_DAYS))
        .execute(&state.db)
        .await?;
    Ok(id)
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, session_id.to_string()))
            .path("/")
            .http_only(true),
    )
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Other(anyhow::anyhow!("hashing password: {err}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| AppError::Other(anyhow::anyhow!("stored password hash invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
