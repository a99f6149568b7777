// src/item.rs
//! Feed item shapes shared by the ranking pipeline and the HTTP layer.
//!
//! Wire names are camelCase to match what the fetch layer produces
//! (`publishedAt`, `sourceCount`, `isBreaking`, ...). `headline` and `link`
//! are accepted as aliases for `title` and `url`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feed name → items, as pushed by the fetch layer (`world`, `india`, `social`, ...).
pub type Feeds = BTreeMap<String, Vec<NewsItem>>;

/// Sentiment label attached upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
}

/// Per-component view of an impact score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub freshness: f64,
    pub source_score: f64,
    pub impact: f64,
    pub live_boost: f64,
    pub breaking_boost: f64,
}

impl ScoreBreakdown {
    /// `(freshness + sourceScore) * impact * liveBoost * breakingBoost`
    pub fn composite(&self) -> f64 {
        (self.freshness + self.source_score) * self.impact * self.live_boost * self.breaking_boost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: Option<String>,
    #[serde(default, alias = "headline")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default, alias = "link", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_count: Option<u32>,
    #[serde(default)]
    pub is_breaking: bool,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critics_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<f64>,
    #[serde(
        default,
        rename = "_scoreBreakdown",
        skip_serializing_if = "Option::is_none"
    )]
    pub score_breakdown: Option<ScoreBreakdown>,
}

/// Feeds send ids either as strings or as bare numbers.
fn id_from_string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(de)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl NewsItem {
    /// Publication time with missing treated as epoch 0 (sorts oldest).
    pub fn published_ms(&self) -> i64 {
        self.published_at.unwrap_or(0)
    }

    /// Number of corroborating sources, at least 1.
    pub fn sources(&self) -> u32 {
        self.source_count.unwrap_or(1).max(1)
    }

    pub fn sentiment_label(&self) -> SentimentLabel {
        self.sentiment
            .as_ref()
            .map(|s| s.label)
            .unwrap_or_default()
    }

    /// Lower-cased `title + " " + summary`, the text keyword groups match against.
    pub fn haystack(&self) -> String {
        let mut s = String::with_capacity(self.title.len() + 1 + self.summary_len());
        s.push_str(&self.title);
        s.push(' ');
        if let Some(sum) = &self.summary {
            s.push_str(sum);
        }
        s.to_lowercase()
    }

    fn summary_len(&self) -> usize {
        self.summary.as_ref().map_or(0, String::len)
    }

    /// Id if present, otherwise a short hash of url/title.
    pub fn stable_id(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|s| !s.trim().is_empty()) {
            return id.to_string();
        }
        let key = self.url.as_deref().unwrap_or(&self.title);
        crate::telemetry::anon_hash(key)
    }
}

/// A news item with exactly one region assigned by a classifier or a feed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_label: Option<String>,
}

impl ClassifiedItem {
    pub fn new(item: NewsItem, region: impl Into<String>) -> Self {
        Self {
            item,
            region: region.into(),
            region_label: None,
        }
    }

    pub fn published_ms(&self) -> i64 {
        self.item.published_ms()
    }
}
