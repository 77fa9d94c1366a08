use std::{collections::HashMap, fmt, fs::File, net::SocketAddr};

use anyhow::Context;
use chrono::Utc;
use cucumber::{given, then, when, World as _};
use switchback::{
    auth::{self, Identity},
    bookmarks::BookmarkState,
    cards::{self, HikeCard, ReviewCard},
    config::AppConfig,
    db::init_pool,
    models::{hike::NewHike, quote::Quote, review::NewReview},
    services::store::HikeStore,
    state::AppState,
};
use tempfile::TempDir;
use tokio::sync::broadcast;

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    registered_user: Option<Identity>,
    /// Hike name -> generated document id.
    hikes: HashMap<String, String>,
    icon_state: Option<BookmarkState>,
    cards: Vec<HikeCard>,
    review_cards: Vec<ReviewCard>,
    quote_rx: Option<QuoteSubscription>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn store(&self) -> &HikeStore {
        &self.app_state().store
    }

    fn user_uuid(&self) -> &str {
        &self
            .registered_user
            .as_ref()
            .expect("user must be registered first")
            .uuid
    }

    fn hike_id(&self, name: &str) -> &str {
        self.hikes
            .get(name)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("no hike named {name} was created"))
    }
}

struct TestState {
    app: AppState,
    database_url: String,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;

        let db_path = root.path().join("bdd.sqlite");
        File::create(&db_path)?;
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            image_root: root.path().join("images"),
            cookie_secret: "bdd-cookie-secret".into(),
        };

        let db = init_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let store = HikeStore::new(db.clone());
        let app = AppState::new(config, db, store);
        Ok(Self {
            app,
            database_url,
            _root: root,
        })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

struct QuoteSubscription(broadcast::Receiver<Quote>);

impl fmt::Debug for QuoteSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteSubscription").finish()
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.registered_user = None;
    world.hikes.clear();
    world.icon_state = None;
    world.cards.clear();
    world.review_cards.clear();
    world.quote_rx = None;
}

#[given(
    regex = r#"^a registered user \"([^\"]+)\" with email \"([^\"]+)\" and password \"([^\"]+)\"$"#
)]
async fn given_registered_user(
    world: &mut AppWorld,
    username: String,
    email: String,
    password: String,
) {
    let created = auth::register_user(world.app_state(), &username, &email, &password)
        .await
        .expect("register user");
    world.registered_user = Some(created);
}

#[given(regex = r#"^a hike \"([^\"]+)\" with code \"([^\"]+)\"$"#)]
async fn given_hike(world: &mut AppWorld, name: String, code: String) {
    let hike = world
        .store()
        .add_hike(NewHike {
            code,
            name: name.clone(),
            city: "Somewhere".into(),
            level: "easy".into(),
            details: None,
            length: 10.0,
            hike_time: 60,
            lat: 0.0,
            lng: 0.0,
        })
        .await
        .expect("add hike");
    world.hikes.insert(name, hike.id);
}

#[given("the sample hikes are seeded")]
async fn given_sample_hikes(world: &mut AppWorld) {
    switchback::services::seed::seed_hikes(world.store())
        .await
        .expect("seed hikes");
    for hike in world.store().list_hikes().await.expect("list hikes") {
        world.hikes.insert(hike.name.clone(), hike.id);
    }
}

#[when(regex = r#"^I toggle the bookmark for \"([^\"]+)\" rendered as \"(saved|unsaved)\"$"#)]
async fn when_toggle_bookmark(world: &mut AppWorld, name: String, rendered: String) {
    let rendered = match rendered.as_str() {
        "saved" => BookmarkState::Saved,
        _ => BookmarkState::Unsaved,
    };
    let hike_id = world.hike_id(&name).to_string();
    let user_uuid = world.user_uuid().to_string();
    let next = world
        .app_state()
        .bookmarks
        .toggle(&user_uuid, &hike_id, rendered)
        .await
        .expect("toggle bookmark");
    world.icon_state = Some(next);
}

#[given("the store connection is closed")]
async fn given_store_closed(world: &mut AppWorld) {
    world.app_state().db.close().await;
}

#[when(
    regex = r#"^I toggle the bookmark for \"([^\"]+)\" rendered as \"(saved|unsaved)\" against the unavailable store$"#
)]
async fn when_toggle_against_unavailable(world: &mut AppWorld, name: String, rendered: String) {
    let rendered = match rendered.as_str() {
        "saved" => BookmarkState::Saved,
        _ => BookmarkState::Unsaved,
    };
    let hike_id = world.hike_id(&name).to_string();
    let user_uuid = world.user_uuid().to_string();
    let next = world
        .app_state()
        .bookmarks
        .toggle_logged(&user_uuid, &hike_id, rendered)
        .await;
    world.icon_state = Some(next);
}

#[then("the stored bookmark set is still empty on disk")]
async fn then_disk_set_empty(world: &mut AppWorld) {
    let database_url = world
        .state
        .as_ref()
        .expect("state must be initialised first")
        .database_url
        .clone();
    let db = init_pool(&database_url).await.expect("reopen store file");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookmarks")
        .fetch_one(&db)
        .await
        .expect("count bookmarks");
    assert_eq!(count, 0);
}

#[when(regex = r#"^the add mutation is issued twice for \"([^\"]+)\"$"#)]
async fn when_add_twice(world: &mut AppWorld, name: String) {
    let hike_id = world.hike_id(&name).to_string();
    let user_uuid = world.user_uuid().to_string();
    for _ in 0..2 {
        world
            .store()
            .add_bookmark(&user_uuid, &hike_id)
            .await
            .expect("add bookmark");
    }
}

#[then(regex = r#"^the bookmark set contains only \"([^\"]+)\"$"#)]
async fn then_bookmark_set_contains_only(world: &mut AppWorld, name: String) {
    let bookmarks = world
        .store()
        .bookmarks_for(world.user_uuid())
        .await
        .expect("load bookmarks");
    assert_eq!(bookmarks, vec![world.hike_id(&name).to_string()]);
}

#[then("the bookmark set is empty")]
async fn then_bookmark_set_empty(world: &mut AppWorld) {
    let bookmarks = world
        .store()
        .bookmarks_for(world.user_uuid())
        .await
        .expect("load bookmarks");
    assert!(bookmarks.is_empty(), "expected no bookmarks: {bookmarks:?}");
}

#[then(regex = r#"^the icon state is \"([^\"]+)\"$"#)]
async fn then_icon_state(world: &mut AppWorld, glyph: String) {
    let state = world.icon_state.expect("a toggle must have run first");
    assert_eq!(state.glyph(), glyph);
}

#[when("I render the dashboard cards")]
async fn when_render_cards(world: &mut AppWorld) {
    let bookmarks = world
        .store()
        .bookmarks_for(world.user_uuid())
        .await
        .expect("load bookmarks");
    let hikes = world.store().list_hikes().await.expect("list hikes");
    world.cards = cards::hike_cards(hikes, &bookmarks);
}

#[then(regex = r"^I see (\d+) cards$")]
async fn then_card_count(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.cards.len(), expected);
}

#[then(regex = r#"^the card for \"([^\"]+)\" shows the \"([^\"]+)\" glyph$"#)]
async fn then_card_glyph(world: &mut AppWorld, name: String, glyph: String) {
    let card = world
        .cards
        .iter()
        .find(|card| card.title == name)
        .unwrap_or_else(|| panic!("no card titled {name}"));
    assert_eq!(card.glyph, glyph);
}

#[when(regex = r#"^I submit a review titled \"([^\"]+)\" with rating (\d+) for \"([^\"]+)\"$"#)]
async fn when_submit_review(world: &mut AppWorld, title: String, rating: i64, name: String) {
    let hike_id = world.hike_id(&name).to_string();
    world
        .store()
        .add_review(NewReview {
            hike_id,
            title: Some(title),
            level: None,
            season: None,
            description: None,
            flooded: None,
            scrambled: None,
            rating,
        })
        .await
        .expect("add review");
}

#[when(regex = r#"^I render the review cards for \"([^\"]+)\"$"#)]
async fn when_render_reviews(world: &mut AppWorld, name: String) {
    let hike_id = world.hike_id(&name).to_string();
    let reviews = world
        .store()
        .reviews_for(&hike_id)
        .await
        .expect("load reviews");
    world.review_cards = cards::review_cards(reviews);
}

#[then(regex = r"^I see (\d+) review cards$")]
async fn then_review_card_count(world: &mut AppWorld, expected: usize) {
    assert_eq!(world.review_cards.len(), expected);
}

#[then(regex = r#"^review \"([^\"]+)\" shows (\d+) filled stars$"#)]
async fn then_review_stars(world: &mut AppWorld, title: String, filled: usize) {
    let card = world
        .review_cards
        .iter()
        .find(|card| card.title == title)
        .unwrap_or_else(|| panic!("no review card titled {title}"));
    assert_eq!(card.stars.iter().filter(|&&star| star == "star").count(), filled);
}

#[then("every review card shows 5 stars in total")]
async fn then_star_total(world: &mut AppWorld) {
    for card in &world.review_cards {
        assert_eq!(card.stars.len(), cards::STAR_COUNT);
    }
}

#[then(regex = r#"^the stored review \"([^\"]+)\" has a creation timestamp$"#)]
async fn then_review_timestamp(world: &mut AppWorld, title: String) {
    let mut found = false;
    for (_, hike_id) in world.hikes.iter() {
        for review in world
            .store()
            .reviews_for(hike_id)
            .await
            .expect("load reviews")
        {
            if review.title.as_deref() == Some(title.as_str()) {
                assert!(review.created_at <= Utc::now());
                found = true;
            }
        }
    }
    assert!(found, "no stored review titled {title}");
}

#[given("a quote subscription")]
async fn given_quote_subscription(world: &mut AppWorld) {
    world.quote_rx = Some(QuoteSubscription(world.store().subscribe_quotes()));
}

#[when(regex = r#"^the quote for \"([^\"]+)\" is set to \"([^\"]+)\"$"#)]
async fn when_set_quote(world: &mut AppWorld, day: String, text: String) {
    world
        .store()
        .set_quote(&day, &text)
        .await
        .expect("set quote");
}

#[then(regex = r#"^the subscriber observes the quote \"([^\"]+)\"$"#)]
async fn then_subscriber_observes(world: &mut AppWorld, text: String) {
    let rx = world
        .quote_rx
        .as_mut()
        .expect("a quote subscription must exist");
    let quote = rx.0.recv().await.expect("quote event");
    assert_eq!(quote.quote, text);
}

#[then(regex = r#"^the quote for \"([^\"]+)\" reads \"([^\"]+)\"$"#)]
async fn then_quote_reads(world: &mut AppWorld, day: String, text: String) {
    let quote = world
        .store()
        .quote_for(&day)
        .await
        .expect("read quote")
        .expect("quote document present");
    assert_eq!(quote.quote, text);
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
