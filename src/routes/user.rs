use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    auth::CurrentUser,
    bookmarks::BookmarkState,
    cards::{self, HikeCard, ReviewCard},
    error::AppError,
    models::{quote, review::NewReview},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/bookmarks/toggle", post(toggle_bookmark))
        .route("/hike", get(hike_detail))
        .route("/hike/review", get(review_new_form).post(review_new_submit))
}

const QUOTE_FALLBACK: &str = "Every trail has a story.";

#[derive(Template)]
#[template(path = "user/dashboard.html")]
struct DashboardTemplate {
    greeting_name: String,
    quote: String,
    cards: Vec<HikeCard>,
}

async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let Some(identity) = current.signed_in() else {
        return Ok(Redirect::to("/login").into_response());
    };

    // Bookmark snapshot is read once here; cards derive their initial
    // icon state from it.
    let bookmarks = state.store.bookmarks_for(&identity.uuid).await?;
    let cards = match state.store.list_hikes().await {
        Ok(hikes) => cards::hike_cards(hikes, &bookmarks),
        Err(err) => {
            error!("error getting hike documents: {err}");
            Vec::new()
        }
    };

    let quote = match state.store.quote_for(&quote::today_key()).await {
        Ok(Some(found)) => found.quote,
        Ok(None) => {
            warn!("no quote document for today");
            QUOTE_FALLBACK.to_string()
        }
        Err(err) => {
            error!("error reading quote of the day: {err}");
            QUOTE_FALLBACK.to_string()
        }
    };

    Ok(AskamaTemplateResponse::into_response(DashboardTemplate {
        greeting_name: identity.greeting_name().to_string(),
        quote,
        cards,
    }))
}

#[derive(Deserialize)]
struct ToggleForm {
    hike_id: String,
    /// Membership state the card rendered, echoed back by the form.
    saved: bool,
}

async fn toggle_bookmark(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, AppError> {
    let identity = current.require_user()?;
    let rendered = BookmarkState::from_saved(form.saved);
    // Failures are logged inside; the stored set and the re-rendered
    // glyph are both left untouched on error.
    state
        .bookmarks
        .toggle_logged(&identity.uuid, &form.hike_id, rendered)
        .await;
    Ok(Redirect::to("/me"))
}

#[derive(Deserialize)]
struct HikeQuery {
    #[serde(rename = "docID")]
    doc_id: Option<String>,
}

#[derive(Template)]
#[template(path = "user/hike_detail.html")]
struct HikeDetailTemplate {
    hike_id: String,
    name: String,
    image: String,
    reviews: Vec<ReviewCard>,
}

async fn hike_detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<HikeQuery>,
) -> Result<Response, AppError> {
    if current.signed_in().is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    let Some(hike_id) = params.doc_id else {
        error!("no hike ID found in the URL");
        return Err(AppError::MissingParam("docID"));
    };

    let hike = match state.store.get_hike(&hike_id).await? {
        Some(hike) => hike,
        None => {
            error!("no hike document found for {hike_id}");
            return Err(AppError::NotFound);
        }
    };

    let reviews = match state.store.reviews_for(&hike_id).await {
        Ok(reviews) => cards::review_cards(reviews),
        Err(err) => {
            error!("error loading reviews for {hike_id}: {err}");
            Vec::new()
        }
    };

    Ok(AskamaTemplateResponse::into_response(HikeDetailTemplate {
        hike_id,
        image: cards::image_path(&hike.code),
        name: hike.name,
        reviews,
    }))
}

#[derive(Template)]
#[template(path = "user/review_new.html")]
struct ReviewNewTemplate {
    hike_id: String,
    hike_name: String,
}

async fn review_new_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<HikeQuery>,
) -> Result<Response, AppError> {
    if current.signed_in().is_none() {
        return Ok(Redirect::to("/login").into_response());
    }
    let Some(hike_id) = params.doc_id else {
        error!("no hike ID found in the URL, cannot continue");
        return Err(AppError::MissingParam("docID"));
    };
    let hike = state
        .store
        .get_hike(&hike_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(AskamaTemplateResponse::into_response(ReviewNewTemplate {
        hike_id,
        hike_name: hike.name,
    }))
}

#[derive(Deserialize)]
struct ReviewForm {
    hike_id: String,
    title: Option<String>,
    level: Option<String>,
    season: Option<String>,
    description: Option<String>,
    flooded: Option<String>,
    scrambled: Option<String>,
    rating: i64,
}

async fn review_new_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect, AppError> {
    current.require_user()?;
    let review = NewReview {
        hike_id: form.hike_id.clone(),
        title: normalize_optional(form.title),
        level: normalize_optional(form.level),
        season: normalize_optional(form.season),
        description: normalize_optional(form.description),
        flooded: normalize_optional(form.flooded),
        scrambled: normalize_optional(form.scrambled),
        rating: form.rating.clamp(0, cards::STAR_COUNT as i64),
    };
    state.store.add_review(review).await?;
    Ok(Redirect::to(&format!("/me/hike?docID={}", form.hike_id)))
}

fn normalize_optional(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
