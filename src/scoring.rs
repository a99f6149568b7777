// src/scoring.rs
//! Impact scoring for "Top Stories".
//!
//! ```text
//! freshness     = max_freshness * 0.5^(age_hours / half_life_hours)
//! sourceScore   = source_scale * tier(source)            tier ∈ [0,1]
//! impact        = (1 + consensus_step * (min(sourceCount, cap) - 1)) * sentiment_weight
//! liveBoost     = live_boost      if isLive     else 1
//! breakingBoost = breaking_boost  if isBreaking else 1
//! impactScore   = (freshness + sourceScore) * impact * liveBoost * breakingBoost
//! ```
//!
//! Age is clamped at 0 for timestamps in the future, so freshness never exceeds
//! `max_freshness`; it halves every `half_life_hours` and never goes negative.
//! Everything here is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::freshness::{age_ms, MS_PER_HOUR};
use crate::item::{NewsItem, ScoreBreakdown, SentimentLabel};
use crate::source_weights::SourceWeightsConfig;

/* ----------------------------
Weights
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingSettings {
    /// Non-breaking items above this score get the "trending" badge.
    pub threshold: f64,
}

impl Default for TrendingSettings {
    fn default() -> Self {
        Self { threshold: 12.0 }
    }
}

/// Per-label multipliers folded into `impact`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentWeights {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl Default for SentimentWeights {
    fn default() -> Self {
        Self {
            positive: 1.0,
            negative: 1.0,
            neutral: 1.0,
        }
    }
}

impl SentimentWeights {
    pub fn for_label(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub max_freshness: f64,
    pub freshness_half_life_hours: f64,
    pub source_scale: f64,
    pub breaking_boost: f64,
    pub live_boost: f64,
    pub consensus_step: f64,
    pub consensus_cap: u32,
    pub sentiment: SentimentWeights,
    pub trending: TrendingSettings,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            max_freshness: 10.0,
            freshness_half_life_hours: 6.0,
            source_scale: 5.0,
            breaking_boost: 1.5,
            live_boost: 1.2,
            consensus_step: 0.25,
            consensus_cap: 6,
            sentiment: SentimentWeights::default(),
            trending: TrendingSettings::default(),
        }
    }
}

impl RankingWeights {
    /// Replace out-of-range values with defaults so the score stays monotonic:
    /// boosts must exceed 1, `max_freshness` and sentiment weights must be
    /// positive, the remaining scales and steps non-negative. All finite.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let non_neg = |v: f64, dv: f64| if v.is_finite() && v >= 0.0 { v } else { dv };
        let positive = |v: f64, dv: f64| if v.is_finite() && v > 0.0 { v } else { dv };
        let above_one = |v: f64, dv: f64| if v.is_finite() && v > 1.0 { v } else { dv };

        Self {
            max_freshness: positive(self.max_freshness, d.max_freshness),
            freshness_half_life_hours: if self.freshness_half_life_hours.is_finite()
                && self.freshness_half_life_hours > 0.0
            {
                self.freshness_half_life_hours
            } else {
                d.freshness_half_life_hours
            },
            source_scale: non_neg(self.source_scale, d.source_scale),
            breaking_boost: above_one(self.breaking_boost, d.breaking_boost),
            live_boost: above_one(self.live_boost, d.live_boost),
            consensus_step: non_neg(self.consensus_step, d.consensus_step),
            consensus_cap: self.consensus_cap.max(1),
            sentiment: SentimentWeights {
                positive: positive(self.sentiment.positive, 1.0),
                negative: positive(self.sentiment.negative, 1.0),
                neutral: positive(self.sentiment.neutral, 1.0),
            },
            trending: TrendingSettings {
                threshold: if self.trending.threshold.is_finite() {
                    self.trending.threshold
                } else {
                    d.trending.threshold
                },
            },
        }
    }
}

/* ----------------------------
Sub-scores
---------------------------- */

/// Exponential half-life decay; saturates toward 0 for very old items.
pub fn freshness_score(published_at: Option<i64>, now_ms: i64, w: &RankingWeights) -> f64 {
    let age = age_ms(published_at.unwrap_or(0), now_ms).max(0);
    let age_hours = age as f64 / MS_PER_HOUR as f64;
    let v = w.max_freshness * 0.5_f64.powf(age_hours / w.freshness_half_life_hours);
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// Consensus × sentiment multiplier. 1.0 for a single neutral source.
pub fn impact_multiplier(source_count: u32, sentiment: SentimentLabel, w: &RankingWeights) -> f64 {
    let n = source_count.clamp(1, w.consensus_cap.max(1));
    let consensus = 1.0 + w.consensus_step * f64::from(n - 1);
    consensus * w.sentiment.for_label(sentiment)
}

/* ----------------------------
Composite
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scored {
    pub impact_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score one item. Pure: same inputs, same output.
pub fn score(
    item: &NewsItem,
    weights: &RankingWeights,
    sources: &SourceWeightsConfig,
    now_ms: i64,
) -> Scored {
    let w = weights.sanitized();

    let breakdown = ScoreBreakdown {
        freshness: freshness_score(item.published_at, now_ms, &w),
        source_score: w.source_scale * f64::from(sources.weight_for(&item.source)),
        impact: impact_multiplier(item.sources(), item.sentiment_label(), &w),
        live_boost: if item.is_live { w.live_boost } else { 1.0 },
        breaking_boost: if item.is_breaking {
            w.breaking_boost
        } else {
            1.0
        },
    };

    Scored {
        impact_score: breakdown.composite(),
        breakdown,
    }
}

/// Copy of `item` with `impactScore` and `_scoreBreakdown` filled in.
pub fn score_item(
    item: &NewsItem,
    weights: &RankingWeights,
    sources: &SourceWeightsConfig,
    now_ms: i64,
) -> NewsItem {
    let s = score(item, weights, sources, now_ms);
    let mut out = item.clone();
    out.impact_score = Some(s.impact_score);
    out.score_breakdown = Some(s.breakdown);
    out
}

/// "Trending" badge: not breaking and scored above the threshold.
pub fn is_trending(item: &NewsItem, weights: &RankingWeights) -> bool {
    !item.is_breaking
        && item
            .impact_score
            .is_some_and(|s| s > weights.trending.threshold)
}

/// Score every item and order by impact (desc), newer first on ties,
/// then input order.
pub fn rank_top_stories(
    items: &[NewsItem],
    weights: &RankingWeights,
    sources: &SourceWeightsConfig,
    now_ms: i64,
) -> Vec<NewsItem> {
    let mut scored: Vec<NewsItem> = items
        .iter()
        .map(|it| score_item(it, weights, sources, now_ms))
        .collect();

    scored.sort_by(|a, b| {
        let sa = a.impact_score.unwrap_or(0.0);
        let sb = b.impact_score.unwrap_or(0.0);
        sb.total_cmp(&sa)
            .then_with(|| b.published_ms().cmp(&a.published_ms()))
    });

    if crate::telemetry::dev_logging_enabled() {
        let top: Vec<String> = scored
            .iter()
            .take(5)
            .map(|it| format!("{}={:.2}", it.stable_id(), it.impact_score.unwrap_or(0.0)))
            .collect();
        tracing::info!(target: "ranking", count = scored.len(), top = ?top, "top stories ranked");
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Sentiment;

    const NOW: i64 = 1_700_000_000_000;

    fn base() -> NewsItem {
        NewsItem {
            id: Some("1".into()),
            title: "Budget session opens".into(),
            source: "Reuters".into(),
            published_at: Some(NOW - 2 * MS_PER_HOUR),
            ..Default::default()
        }
    }

    fn s(it: &NewsItem) -> Scored {
        score(it, &RankingWeights::default(), &SourceWeightsConfig::default_seed(), NOW)
    }

    #[test]
    fn composite_matches_formula() {
        let mut it = base();
        it.is_breaking = true;
        it.is_live = true;
        it.source_count = Some(3);
        let r = s(&it);
        let b = r.breakdown;
        let expect = (b.freshness + b.source_score) * b.impact * b.live_boost * b.breaking_boost;
        assert!((r.impact_score - expect).abs() < 1e-9);
        assert!((b.impact - 1.5).abs() < 1e-9);
        assert!((b.breaking_boost - 1.5).abs() < 1e-9);
        assert!((b.live_boost - 1.2).abs() < 1e-9);
        assert!((b.source_score - 5.0 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn freshness_halves_per_half_life_and_saturates() {
        let w = RankingWeights::default();
        let f0 = freshness_score(Some(NOW), NOW, &w);
        let f6 = freshness_score(Some(NOW - 6 * MS_PER_HOUR), NOW, &w);
        assert!((f0 - 10.0).abs() < 1e-9);
        assert!((f6 - 5.0).abs() < 1e-9);

        let ancient = freshness_score(Some(0), NOW, &w);
        assert!(ancient >= 0.0 && ancient < 1e-6);
        assert_eq!(freshness_score(None, NOW, &w), ancient);

        // Future timestamps don't exceed the cap.
        assert!((freshness_score(Some(NOW + MS_PER_HOUR), NOW, &w) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn freshness_is_monotonic_in_age() {
        let w = RankingWeights::default();
        let mut prev = f64::INFINITY;
        for h in 0..200 {
            let f = freshness_score(Some(NOW - h * MS_PER_HOUR), NOW, &w);
            assert!(f <= prev);
            prev = f;
        }
    }

    #[test]
    fn more_sources_never_lower_the_score() {
        let one = s(&base()).impact_score;
        let mut three = base();
        three.source_count = Some(3);
        assert!(s(&three).impact_score >= one);

        let mut prev = 0.0;
        for n in 1..12 {
            let mut it = base();
            it.source_count = Some(n);
            let v = s(&it).impact_score;
            assert!(v >= prev, "n={n}");
            prev = v;
        }
    }

    #[test]
    fn breaking_strictly_increases() {
        let calm = s(&base()).impact_score;
        let mut br = base();
        br.is_breaking = true;
        assert!(s(&br).impact_score > calm);
    }

    #[test]
    fn rescoring_is_idempotent() {
        let it = base();
        assert_eq!(s(&it), s(&it));
        let once = score_item(&it, &RankingWeights::default(), &SourceWeightsConfig::default(), NOW);
        let twice =
            score_item(&once, &RankingWeights::default(), &SourceWeightsConfig::default(), NOW);
        assert_eq!(once.impact_score, twice.impact_score);
        assert_eq!(once.score_breakdown, twice.score_breakdown);
    }

    #[test]
    fn unknown_source_uses_default_tier() {
        let mut it = base();
        it.source = "Some Blog".into();
        assert!((s(&it).breakdown.source_score - 5.0 * 0.60).abs() < 1e-6);
    }

    #[test]
    fn sentiment_weight_feeds_impact() {
        let mut w = RankingWeights::default();
        w.sentiment.negative = 1.3;
        let mut it = base();
        it.sentiment = Some(Sentiment {
            label: SentimentLabel::Negative,
        });
        let r = score(&it, &w, &SourceWeightsConfig::default(), NOW);
        assert!((r.breakdown.impact - 1.3).abs() < 1e-9);
    }

    #[test]
    fn bad_weights_are_sanitized() {
        let w = RankingWeights {
            breaking_boost: 0.5,
            live_boost: f64::NAN,
            freshness_half_life_hours: 0.0,
            consensus_step: -1.0,
            consensus_cap: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(w.breaking_boost, 1.5);
        assert_eq!(w.live_boost, 1.2);
        assert_eq!(w.freshness_half_life_hours, 6.0);
        assert_eq!(w.consensus_step, 0.25);
        assert_eq!(w.consensus_cap, 1);
    }

    #[test]
    fn zero_sentiment_weight_cannot_cancel_breaking() {
        let w = RankingWeights {
            max_freshness: 0.0,
            sentiment: SentimentWeights {
                positive: 0.0,
                negative: -2.0,
                neutral: 0.0,
            },
            ..Default::default()
        };
        let clean = w.sanitized();
        assert_eq!(clean.max_freshness, 10.0);
        assert_eq!(clean.sentiment, SentimentWeights::default());

        let src = SourceWeightsConfig::default_seed();
        let calm = score(&base(), &w, &src, NOW).impact_score;
        let mut br = base();
        br.is_breaking = true;
        assert!(score(&br, &w, &src, NOW).impact_score > calm);
    }

    #[test]
    fn extreme_timestamp_scores_without_overflow() {
        let w = RankingWeights::default();
        assert_eq!(freshness_score(Some(i64::MIN), NOW, &w), 0.0);
        assert!((freshness_score(Some(i64::MAX), i64::MIN, &w) - 10.0).abs() < 1e-9);

        let mut ancient = base();
        ancient.published_at = Some(i64::MIN);
        let r = s(&ancient);
        assert_eq!(r.breakdown.freshness, 0.0);
        assert!(r.impact_score.is_finite());
        assert!(r.impact_score < s(&base()).impact_score);
    }

    #[test]
    fn trending_requires_threshold_and_not_breaking() {
        let w = RankingWeights::default();
        let mut it = base();
        it.impact_score = Some(12.5);
        assert!(is_trending(&it, &w));
        it.is_breaking = true;
        assert!(!is_trending(&it, &w));
        it.is_breaking = false;
        it.impact_score = Some(12.0);
        assert!(!is_trending(&it, &w));
        it.impact_score = None;
        assert!(!is_trending(&it, &w));
    }

    #[test]
    fn ranking_orders_by_score_then_recency() {
        let mut old = base();
        old.id = Some("old".into());
        old.published_at = Some(NOW - 30 * MS_PER_HOUR);
        let mut fresh = base();
        fresh.id = Some("fresh".into());
        fresh.published_at = Some(NOW - MS_PER_HOUR);
        let mut hot = base();
        hot.id = Some("hot".into());
        hot.published_at = Some(NOW - 3 * MS_PER_HOUR);
        hot.is_breaking = true;
        hot.source_count = Some(4);

        let ranked = rank_top_stories(
            &[old, fresh, hot],
            &RankingWeights::default(),
            &SourceWeightsConfig::default(),
            NOW,
        );
        let ids: Vec<_> = ranked.iter().map(|i| i.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["hot", "fresh", "old"]);
        assert!(ranked.iter().all(|i| i.score_breakdown.is_some()));
    }
}
