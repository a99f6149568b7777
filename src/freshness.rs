// src/freshness.rs
//! # Freshness
//! Age-based filtering plus display-only staleness helpers.
//!
//! - [`filter_fresh`] drops items older than the configured limit. Items with no
//!   `publishedAt` count as epoch 0 and are dropped for any realistic limit.
//! - [`Staleness`] tiers (15 min / 4 h) only dim cards; they never remove data.
//! - [`time_ago`] renders compact labels like "5h" or "Now".

use serde::Serialize;

use crate::item::NewsItem;

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Default freshness limit used when settings don't provide one.
pub const DEFAULT_FRESHNESS_LIMIT_HOURS: f64 = 72.0;

const STALE_AFTER_MS: i64 = 15 * MS_PER_MINUTE;
const EXPIRED_AFTER_MS: i64 = 4 * MS_PER_HOUR;

/// `now - published`, saturating so extreme timestamps can't overflow.
pub fn age_ms(published_ms: i64, now_ms: i64) -> i64 {
    now_ms.saturating_sub(published_ms)
}

/// Limit in milliseconds; non-finite or negative limits disable filtering.
fn limit_ms(limit_hours: f64) -> Option<f64> {
    if limit_hours.is_finite() && limit_hours >= 0.0 {
        Some(limit_hours * MS_PER_HOUR as f64)
    } else {
        None
    }
}

/// True if `now - publishedAt < limit`.
pub fn is_fresh(item: &NewsItem, limit_hours: f64, now_ms: i64) -> bool {
    match limit_ms(limit_hours) {
        Some(limit) => (age_ms(item.published_ms(), now_ms) as f64) < limit,
        None => true,
    }
}

/// Keep items published within `limit_hours` of `now_ms`, preserving order.
pub fn filter_fresh(items: &[NewsItem], limit_hours: f64, now_ms: i64) -> Vec<NewsItem> {
    items
        .iter()
        .filter(|it| is_fresh(it, limit_hours, now_ms))
        .cloned()
        .collect()
}

/// Owned variant for pipelines that already hold the vector.
pub fn retain_fresh(mut items: Vec<NewsItem>, limit_hours: f64, now_ms: i64) -> Vec<NewsItem> {
    items.retain(|it| is_fresh(it, limit_hours, now_ms));
    items
}

/// Display tier for how old a data point looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Staleness {
    Fresh,
    Stale,
    Expired,
}

impl Staleness {
    /// Tier for an age; `None` (unknown timestamp) is treated as expired.
    pub fn of(age_ms: Option<i64>) -> Self {
        match age_ms {
            None => Staleness::Expired,
            Some(a) if a > EXPIRED_AFTER_MS => Staleness::Expired,
            Some(a) if a > STALE_AFTER_MS => Staleness::Stale,
            Some(_) => Staleness::Fresh,
        }
    }

    pub fn for_timestamp(ts_ms: Option<i64>, now_ms: i64) -> Self {
        Self::of(ts_ms.map(|t| age_ms(t, now_ms)))
    }
}

/// Compact relative label: "2y", "3mo", "4d", "5h", "6m" or "Now".
/// Empty string when the timestamp is unknown.
pub fn time_ago(published_at: Option<i64>, now_ms: i64) -> String {
    let Some(ts) = published_at.filter(|t| *t != 0) else {
        return String::new();
    };
    let seconds = (age_ms(ts, now_ms) / 1000) as f64;

    for (div, suffix) in [
        (31_536_000.0, "y"),
        (2_592_000.0, "mo"),
        (86_400.0, "d"),
        (3_600.0, "h"),
        (60.0, "m"),
    ] {
        let interval = seconds / div;
        if interval > 1.0 {
            return format!("{}{}", interval.floor() as i64, suffix);
        }
    }
    "Now".to_string()
}
