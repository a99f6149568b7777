// src/config/settings.rs
//! Dashboard settings, loaded once and passed explicitly into every view.
//!
//! Resolution:
//! 1) $NEWS_RANKER_SETTINGS_PATH (must exist)
//! 2) config/settings.toml
//! 3) built-in defaults
//!
//! `NEWS_RANKER_FRESHNESS_HOURS` overrides `freshness_limit_hours` afterwards.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bucketing::RegionQuotas;
use crate::cache::DEFAULT_CACHE_KEY;
use crate::classify::{self, Classifier, ClassifierConfig, KeywordFilter};
use crate::consensus::ConsensusParams;
use crate::freshness::DEFAULT_FRESHNESS_LIMIT_HOURS;
use crate::scoring::RankingWeights;

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.toml";
pub const ENV_SETTINGS_PATH: &str = "NEWS_RANKER_SETTINGS_PATH";
pub const ENV_FRESHNESS_HOURS: &str = "NEWS_RANKER_FRESHNESS_HOURS";

pub const TECHNOLOGY_SECTION: &str = "technology";
pub const AI_SECTION: &str = "ai";

const DEFAULT_STALE_AFTER_HOURS: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialTrendsSettings {
    pub world_count: usize,
    pub india_count: usize,
    pub tamilnadu_count: usize,
    pub muscat_count: usize,
}

impl Default for SocialTrendsSettings {
    fn default() -> Self {
        Self {
            world_count: 8,
            india_count: 8,
            tamilnadu_count: 5,
            muscat_count: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSettings {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub key: String,
    /// Snapshots at least this old are flagged stale (still served).
    pub stale_after_hours: f64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            key: DEFAULT_CACHE_KEY.to_string(),
            stale_after_hours: DEFAULT_STALE_AFTER_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Items older than this are hidden everywhere. Non-finite or negative disables the filter.
    pub freshness_limit_hours: f64,
    pub ranking_weights: RankingWeights,
    pub social_trends: SocialTrendsSettings,
    /// Display counts per section (`technology`, `ai`, ...).
    pub sections: BTreeMap<String, SectionSettings>,
    /// Items shown per entertainment tab.
    pub entertainment_tab_count: usize,
    /// Feed the top-stories view is built from.
    pub top_stories_feed: String,
    pub consensus: ConsensusParams,
    pub cache: CacheSettings,
    /// JSON source tier table; the built-in seed is used when unset or unreadable.
    pub source_weights_path: Option<PathBuf>,
    /// Classifier overrides keyed by preset name.
    pub classifiers: BTreeMap<String, ClassifierConfig>,
    /// Keyword filter overrides (`trend_titles`, `ai_innovation`).
    pub filters: BTreeMap<String, KeywordFilter>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(TECHNOLOGY_SECTION.to_string(), SectionSettings { count: 5 });
        sections.insert(AI_SECTION.to_string(), SectionSettings { count: 6 });
        Self {
            freshness_limit_hours: DEFAULT_FRESHNESS_LIMIT_HOURS,
            ranking_weights: RankingWeights::default(),
            social_trends: SocialTrendsSettings::default(),
            sections,
            entertainment_tab_count: 8,
            top_stories_feed: "top".to_string(),
            consensus: ConsensusParams::default(),
            cache: CacheSettings::default(),
            source_weights_path: None,
            classifiers: BTreeMap::new(),
            filters: BTreeMap::new(),
        }
    }
}

// parse optional hours env; anything unparsable or non-finite is ignored
fn parse_hours_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl Settings {
    /// Resolve the path, read the file (or fall back to defaults) and apply env overrides.
    pub fn load() -> Result<Self> {
        let mut s = match std::env::var(ENV_SETTINGS_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{ENV_SETTINGS_PATH} points to non-existent path {}",
                        pb.display()
                    ));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_SETTINGS_PATH);
                if pb.exists() {
                    Self::load_from(&pb)?
                } else {
                    tracing::info!(path = DEFAULT_SETTINGS_PATH, "no settings file, using defaults");
                    Self::default()
                }
            }
        };

        s.apply_env_overrides(std::env::var(ENV_FRESHNESS_HOURS).ok());
        Ok(s)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Parse and sanitize. Classifier overrides are validated here so a bad
    /// keyword group fails at startup rather than on first request.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let parsed: Self = toml::from_str(s)?;
        let settings = parsed.sanitized();
        for name in settings.classifiers.keys() {
            settings.classifier(name)?;
        }
        Ok(settings)
    }

    fn apply_env_overrides(&mut self, freshness_raw: Option<String>) {
        if let Some(h) = parse_hours_env(freshness_raw) {
            self.freshness_limit_hours = h;
        }
    }

    fn sanitized(mut self) -> Self {
        self.ranking_weights = self.ranking_weights.sanitized();
        if self.freshness_limit_hours.is_nan() {
            self.freshness_limit_hours = DEFAULT_FRESHNESS_LIMIT_HOURS;
        }
        if !(self.cache.stale_after_hours.is_finite() && self.cache.stale_after_hours > 0.0) {
            self.cache.stale_after_hours = DEFAULT_STALE_AFTER_HOURS;
        }
        if self.cache.key.trim().is_empty() {
            self.cache.key = DEFAULT_CACHE_KEY.to_string();
        }
        if self.top_stories_feed.trim().is_empty() {
            self.top_stories_feed = Self::default().top_stories_feed;
        }
        self
    }

    /// world → india → tamilnadu → muscat with their badge labels.
    pub fn social_quotas(&self) -> RegionQuotas {
        let t = &self.social_trends;
        RegionQuotas::new()
            .with(classify::WORLD, t.world_count, Some("🌍 World"))
            .with(classify::INDIA, t.india_count, Some("🇮🇳 India"))
            .with(classify::TAMILNADU, t.tamilnadu_count, Some("🏛️ Tamil Nadu"))
            .with(classify::MUSCAT, t.muscat_count, Some("🏝️ Muscat"))
    }

    /// Configured count, else 6 for the AI strip and 5 for anything else.
    pub fn section_count(&self, name: &str) -> usize {
        match self.sections.get(name) {
            Some(s) => s.count,
            None if name == AI_SECTION => 6,
            None => 5,
        }
    }

    /// Override from `[classifiers.<name>]`, else the built-in preset.
    pub fn classifier(&self, name: &str) -> Result<Classifier> {
        if let Some(cfg) = self.classifiers.get(name) {
            return Classifier::from_config(cfg.clone())
                .with_context(|| format!("classifier `{name}`"));
        }
        classify::preset(name).ok_or_else(|| anyhow!("unknown classifier `{name}`"))
    }

    /// Override from `[filters.<name>]`, else the built-in filter.
    pub fn filter(&self, name: &str) -> Option<KeywordFilter> {
        if let Some(f) = self.filters.get(name) {
            return Some(f.clone());
        }
        match name {
            "trend_titles" => Some(classify::trend_titles()),
            "ai_innovation" => Some(classify::ai_innovation()),
            _ => None,
        }
    }
}
