// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod bucketing;
pub mod cache;
pub mod classify;
pub mod config;
pub mod consensus;
pub mod dashboard;
pub mod freshness;
pub mod item;
pub mod metrics;
pub mod normalize;
pub mod scoring;
pub mod source_weights;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::bucketing::{distribute, RegionQuotas};
pub use crate::classify::{Classifier, KeywordGroup};
pub use crate::config::Settings;
pub use crate::freshness::filter_fresh;
pub use crate::item::{ClassifiedItem, Feeds, NewsItem, ScoreBreakdown};
pub use crate::scoring::{rank_top_stories, score, RankingWeights};
