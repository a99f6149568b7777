// src/cache.rs
//! File-backed feed cache: one `{timestamp, data}` JSON blob per key.
//!
//! Writes are fire-and-forget (logged, never returned). Reads hand back stale
//! snapshots too, flagged, so views can fall back to them while feeds reload.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::freshness::MS_PER_HOUR;
use crate::item::Feeds;

pub const DEFAULT_CACHE_KEY: &str = "buzz_page_cache";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Epoch ms at which the snapshot was written.
    pub timestamp: i64,
    #[serde(default)]
    pub data: Feeds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedFeeds {
    pub snapshot: FeedSnapshot,
    pub age_ms: i64,
    pub stale: bool,
}

#[derive(Debug, Clone)]
pub struct FeedCache {
    path: PathBuf,
    stale_after_ms: i64,
}

impl FeedCache {
    /// Cache at `<dir>/<key>.json` with the default 8 h staleness cutoff.
    pub fn open(dir: impl AsRef<Path>, key: &str) -> Self {
        let key = if key.trim().is_empty() {
            DEFAULT_CACHE_KEY
        } else {
            key.trim()
        };
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
            stale_after_ms: 8 * MS_PER_HOUR,
        }
    }

    pub fn with_stale_after_hours(mut self, hours: f64) -> Self {
        if hours.is_finite() && hours > 0.0 {
            self.stale_after_ms = (hours * MS_PER_HOUR as f64) as i64;
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `feeds` stamped with `now_ms`. Failures are logged, not
    /// returned; the bool tells whether the snapshot reached disk.
    pub fn store(&self, feeds: &Feeds, now_ms: i64) -> bool {
        match self.try_store(feeds, now_ms) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = ?e, path = %self.path.display(), "feed cache write failed");
                false
            }
        }
    }

    fn try_store(&self, feeds: &Feeds, now_ms: i64) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating cache dir {}", dir.display()))?;
        }
        let blob = serde_json::to_vec(&SnapshotRef {
            timestamp: now_ms,
            data: feeds,
        })
        .context("serializing feed snapshot")?;

        // write-then-rename so readers never see a half-written blob
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    /// Last snapshot, if any. `None` when missing or unreadable.
    pub fn load(&self, now_ms: i64) -> Option<CachedFeeds> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "feed cache unreadable");
                return None;
            }
        };
        let snapshot: FeedSnapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "feed cache corrupt, ignoring");
                return None;
            }
        };

        let age_ms = now_ms.saturating_sub(snapshot.timestamp).max(0);
        let stale = age_ms >= self.stale_after_ms;
        Some(CachedFeeds {
            snapshot,
            age_ms,
            stale,
        })
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    timestamp: i64,
    data: &'a Feeds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::NewsItem;

    const NOW: i64 = 1_700_000_000_000;

    fn feeds() -> Feeds {
        let mut f = Feeds::new();
        f.insert(
            "chennai".into(),
            vec![NewsItem {
                id: Some("c1".into()),
                title: "Metro phase 2 update".into(),
                source: "DT Next".into(),
                published_at: Some(NOW - MS_PER_HOUR),
                ..Default::default()
            }],
        );
        f
    }

    #[test]
    fn store_then_load_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::open(dir.path(), DEFAULT_CACHE_KEY);
        assert!(cache.store(&feeds(), NOW));
        assert!(dir.path().join("buzz_page_cache.json").exists());

        let got = cache.load(NOW + 1_000).unwrap();
        assert_eq!(got.age_ms, 1_000);
        assert!(!got.stale);
        assert_eq!(got.snapshot.timestamp, NOW);
        assert_eq!(got.snapshot.data["chennai"][0].title, "Metro phase 2 update");
    }

    #[test]
    fn old_snapshot_is_still_returned_but_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::open(dir.path(), "k");
        cache.store(&feeds(), NOW);
        let got = cache.load(NOW + 8 * MS_PER_HOUR).unwrap();
        assert!(got.stale);
        assert_eq!(got.snapshot.data.len(), 1);
    }

    #[test]
    fn custom_stale_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::open(dir.path(), "k").with_stale_after_hours(1.0);
        cache.store(&feeds(), NOW);
        assert!(!cache.load(NOW + MS_PER_HOUR - 1).unwrap().stale);
        assert!(cache.load(NOW + MS_PER_HOUR).unwrap().stale);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FeedCache::open(dir.path(), "absent").load(NOW).is_none());
    }

    #[test]
    fn corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::open(dir.path(), "k");
        fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.load(NOW).is_none());
    }

    #[test]
    fn store_into_unwritable_location_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain-file");
        fs::write(&file, "x").unwrap();
        // parent is a regular file, so create_dir_all fails
        let cache = FeedCache::open(&file, "k");
        assert!(!cache.store(&feeds(), NOW));
        assert!(cache.load(NOW).is_none());
    }

    #[test]
    fn blank_key_falls_back_to_default() {
        let cache = FeedCache::open("/tmp", "  ");
        assert!(cache.path().ends_with("buzz_page_cache.json"));
    }

    #[test]
    fn clock_skew_does_not_go_negative() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::open(dir.path(), "k");
        cache.store(&feeds(), NOW);
        assert_eq!(cache.load(NOW - 5_000).unwrap().age_ms, 0);
    }
}
