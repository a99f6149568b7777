use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::cache::FeedCache;
use crate::config::Settings;
use crate::dashboard::{self, SectionView};
use crate::item::{ClassifiedItem, Feeds, NewsItem, ScoreBreakdown};
use crate::metrics::{self as m, Metrics};
use crate::normalize::normalize_item;
use crate::scoring::{is_trending, score};
use crate::source_weights::SourceWeightsConfig;

const DEFAULT_SOURCE_WEIGHTS_PATH: &str = "source_weights.json";
const TOP_STORIES_SECTION: &str = "top_stories";

#[derive(Clone)]
pub struct AppState {
    settings: Arc<RwLock<Settings>>,
    source_weights: Arc<RwLock<SourceWeightsConfig>>,
    cache: Arc<FeedCache>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let sw = match &settings.source_weights_path {
            Some(p) => SourceWeightsConfig::load_from_file(p),
            None => SourceWeightsConfig::default(),
        };
        let cache = FeedCache::open(&settings.cache.dir, &settings.cache.key)
            .with_stale_after_hours(settings.cache.stale_after_hours);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            source_weights: Arc::new(RwLock::new(sw)),
            cache: Arc::new(cache),
        }
    }

    /// Settings from `NEWS_RANKER_SETTINGS_PATH` / `config/settings.toml` / defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Settings::load()?))
    }

    fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn source_weights(&self) -> SourceWeightsConfig {
        self.source_weights
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cached feeds (empty when nothing was stored yet) with age and staleness.
    fn snapshot(&self, now_ms: i64) -> (Feeds, Option<i64>, bool) {
        match self.cache.load(now_ms) {
            Some(c) => {
                m::record_cache_read(c.age_ms, c.stale);
                (c.snapshot.data, Some(c.age_ms), c.stale)
            }
            None => (Feeds::new(), None, false),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let metrics = Metrics::init();

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/feeds", put(put_feeds))
        .route("/views/top-stories", get(view_top_stories))
        .route("/views/social-trends", get(view_social_trends))
        .route("/views/entertainment/{tab}", get(view_entertainment))
        .route("/views/section/{name}", get(view_section))
        .route("/score", post(score_one))
        .route("/classify", post(classify_items))
        .route("/debug/source-weight", get(debug_source_weight))
        .route("/admin/reload-source-weights", get(admin_reload_source_weights))
        .merge(metrics.router())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewResp<T> {
    cache_age_ms: Option<i64>,
    stale: bool,
    view: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredResp {
    feeds: usize,
    items: usize,
    /// False when the cache write failed; views keep serving the previous snapshot.
    stored: bool,
    stored_at: i64,
}

async fn put_feeds(State(state): State<AppState>, Json(body): Json<Feeds>) -> Json<StoredResp> {
    let now = now_ms();
    let feeds: Feeds = body
        .into_iter()
        .map(|(name, items)| (name, items.into_iter().map(normalize_item).collect()))
        .collect();
    let items = feeds.values().map(Vec::len).sum();

    let stored = state.cache.store(&feeds, now);
    if stored {
        m::record_feeds_stored(feeds.len(), items);
    }

    Json(StoredResp {
        feeds: feeds.len(),
        items,
        stored,
        stored_at: now,
    })
}

async fn view_top_stories(State(state): State<AppState>) -> Json<ViewResp<SectionView>> {
    let now = now_ms();
    let settings = state.settings();
    let sources = state.source_weights();
    let (feeds, age, stale) = state.snapshot(now);

    let items = feeds
        .get(&settings.top_stories_feed)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let ranked = dashboard::top_stories(items, &settings, &sources, now);
    let view = dashboard::section_view(
        ranked,
        settings.section_count(TOP_STORIES_SECTION),
        &settings.ranking_weights,
        now,
    );
    m::record_view("top_stories", view.visible.len());

    Json(ViewResp {
        cache_age_ms: age,
        stale,
        view,
    })
}

async fn view_social_trends(State(state): State<AppState>) -> Json<ViewResp<Vec<ClassifiedItem>>> {
    let now = now_ms();
    let settings = state.settings();
    let (feeds, age, stale) = state.snapshot(now);

    let view = dashboard::social_trends(&feeds, &settings, now);
    m::record_view("social_trends", view.len());

    Json(ViewResp {
        cache_age_ms: age,
        stale,
        view,
    })
}

async fn view_entertainment(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Json<ViewResp<Vec<ClassifiedItem>>> {
    let now = now_ms();
    let settings = state.settings();
    let (feeds, age, stale) = state.snapshot(now);

    let view = dashboard::entertainment_tab(&feeds, &tab.to_lowercase(), &settings, now);
    m::record_view("entertainment", view.len());

    Json(ViewResp {
        cache_age_ms: age,
        stale,
        view,
    })
}

async fn view_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ViewResp<SectionView>> {
    let now = now_ms();
    let settings = state.settings();
    let (feeds, age, stale) = state.snapshot(now);

    let view = match name.as_str() {
        "technology" | "tech" => dashboard::tech_section(&feeds, &settings, now),
        "ai" | "ai-innovation" => dashboard::ai_innovation_section(&feeds, &settings, now),
        _ => SectionView::default(),
    };
    m::record_view("section", view.visible.len());

    Json(ViewResp {
        cache_age_ms: age,
        stale,
        view,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResp {
    impact_score: f64,
    breakdown: ScoreBreakdown,
    trending: bool,
}

async fn score_one(State(state): State<AppState>, Json(item): Json<NewsItem>) -> Json<ScoreResp> {
    let settings = state.settings();
    let sources = state.source_weights();
    let s = score(&item, &settings.ranking_weights, &sources, now_ms());

    let mut scored = item;
    scored.impact_score = Some(s.impact_score);
    m::record_scored(1);

    Json(ScoreResp {
        impact_score: s.impact_score,
        breakdown: s.breakdown,
        trending: is_trending(&scored, &settings.ranking_weights),
    })
}

#[derive(Deserialize)]
struct ClassifyReq {
    items: Vec<NewsItem>,
    preset: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResp {
    items: Vec<ClassifiedItem>,
    unclassified: usize,
}

async fn classify_items(
    State(state): State<AppState>,
    Json(body): Json<ClassifyReq>,
) -> Result<Json<ClassifyResp>, (StatusCode, String)> {
    let classifier = state
        .settings()
        .classifier(&body.preset)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("{e:#}")))?;

    let total = body.items.len();
    let items = classifier.label_all(body.items);
    m::record_classified(total);

    Ok(Json(ClassifyResp {
        unclassified: total - items.len(),
        items,
    }))
}

async fn debug_source_weight(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> String {
    let s = q.get("source").cloned().unwrap_or_default();
    let w = state.source_weights().weight_for(&s);
    format!("source='{}' -> weight={:.2}", s, w)
}

async fn admin_reload_source_weights(State(state): State<AppState>) -> String {
    let path = state
        .settings()
        .source_weights_path
        .unwrap_or_else(|| DEFAULT_SOURCE_WEIGHTS_PATH.into());
    let fresh = match SourceWeightsConfig::try_load_from_file(&path) {
        Ok(c) => c,
        Err(e) => return format!("failed: {e:#}"),
    };
    match state.source_weights.write() {
        Ok(mut w) => {
            *w = fresh;
            "reloaded".to_string()
        }
        Err(_) => "failed: lock poisoned".to_string(),
    }
}
