//! # Source Weights
//!
//! Configurable mapping from news outlets (e.g. "Reuters", "The Hindu",
//! "Times of Oman") to source tiers in the range `[0.0, 1.0]`.
//!
//! - Loads from JSON config (weights + aliases).
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings/domains to canonical outlets.
//! - Fallback order: aliases → exact match → substring match (longest key) → default.
//! - Includes a built-in `default_seed()` with the outlets the dashboard reads.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

/// Configuration for source tiers, loaded from JSON or defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWeightsConfig {
    /// Tier used when no match is found.
    #[serde(default = "default_default_weight")]
    pub default_weight: f32,
    /// Explicit tiers for canonical outlet names.
    #[serde(default)]
    pub weights: HashMap<String, f32>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f32 {
    0.60
}

impl Default for SourceWeightsConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SourceWeightsConfig {
    /// Strict loader: errors on unreadable or malformed files.
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading source weights from {}", path.display()))?;
        let mut cfg: Self = serde_json::from_str(&s)
            .with_context(|| format!("parsing source weights in {}", path.display()))?;
        cfg.normalize_keys();
        Ok(cfg)
    }

    /// Load configuration from a JSON file.
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "source weights unavailable, using built-in seed");
                Self::default_seed()
            }
        }
    }

    /// Re-key weights and aliases through `normalize` so lookups line up.
    fn normalize_keys(&mut self) {
        self.weights = self
            .weights
            .drain()
            .map(|(k, v)| (normalize(&k), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        self.aliases = self
            .aliases
            .drain()
            .map(|(k, v)| (normalize(&k), normalize(&v)))
            .filter(|(k, _)| !k.is_empty())
            .collect();
    }

    /// Get the tier for a given source name.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → tier.
    /// 2. Exact tier match.
    /// 3. Whole-word substring fallback, longest key wins (e.g. "The Hindu BusinessLine" → "the hindu").
    /// 4. Default tier.
    pub fn weight_for(&self, source: &str) -> f32 {
        let s = normalize(source);

        // 1) Alias resolution.
        if let Some(canon) = self.aliases.get(&s) {
            if let Some(&w) = self.weights.get(canon) {
                return clamp01(w);
            }
        }

        // 2) Exact match.
        if let Some(&w) = self.weights.get(&s) {
            return clamp01(w);
        }

        // 3) Whole-word substring fallback; longest key wins so map order doesn't matter.
        let padded = format!(" {s} ");
        let best = self
            .weights
            .iter()
            .filter(|(k, _)| padded.contains(&format!(" {k} ")))
            .max_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| b.0.cmp(a.0)));
        if let Some((_, &w)) = best {
            return clamp01(w);
        }

        // 4) Default.
        clamp01(self.default_weight)
    }

    /// Built-in seed with wire services, Indian, Gulf and tech outlets.
    /// Used as fallback if no config is found.
    pub(crate) fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("reuters", 0.95),
            ("associated press", 0.95),
            ("bbc", 0.92),
            ("al jazeera", 0.85),
            ("the guardian", 0.85),
            ("new york times", 0.88),
            ("bloomberg", 0.88),
            ("the hindu", 0.90),
            ("indian express", 0.86),
            ("hindustan times", 0.82),
            ("times of india", 0.80),
            ("ndtv", 0.80),
            ("india today", 0.78),
            ("pti", 0.90),
            ("dt next", 0.72),
            ("dinamalar", 0.70),
            ("dinamani", 0.70),
            ("times of oman", 0.78),
            ("oman observer", 0.78),
            ("muscat daily", 0.74),
            ("gulf news", 0.76),
            ("khaleej times", 0.76),
            ("the verge", 0.80),
            ("techcrunch", 0.80),
            ("ars technica", 0.80),
            ("hacker news", 0.65),
            ("variety", 0.78),
            ("hollywood reporter", 0.78),
            ("pinkvilla", 0.55),
            ("reddit", 0.40),
            ("social", 0.45),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("reuters com", "reuters"),
            ("ap", "associated press"),
            ("ap news", "associated press"),
            ("bbc news", "bbc"),
            ("bbc world", "bbc"),
            ("aljazeera", "al jazeera"),
            ("guardian", "the guardian"),
            ("nytimes", "new york times"),
            ("nyt", "new york times"),
            ("hindu", "the hindu"),
            ("thehindu", "the hindu"),
            ("toi", "times of india"),
            ("timesofindia", "times of india"),
            ("ht", "hindustan times"),
            ("press trust of india", "pti"),
            ("dtnext", "dt next"),
            ("timesofoman", "times of oman"),
            ("observer", "oman observer"),
            ("tc", "techcrunch"),
            ("hn", "hacker news"),
            ("ycombinator", "hacker news"),
            ("thr", "hollywood reporter"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: 0.60,
            weights,
            aliases,
        }
    }
}

/// Normalize input string: lowercase, replace punctuation/dashes with spaces,
/// collapse multiple spaces into one.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    // Replace common separators with spaces.
    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    // Replace disruptive punctuation/whitespace with spaces.
    out = out.replace(['\n', '\r', '\t', '.', ',', '‚', '’', '\'', '|', ':'], " ");

    // Collapse multiple spaces.
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clamp to [0.0, 1.0].
fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
