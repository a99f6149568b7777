// src/bucketing.rs
//! Quota-based bucketing & merge.
//!
//! 1. group classified items by region
//! 2. sort each bucket newest first (missing `publishedAt` = 0)
//! 3. keep the first `quota[region]` items of each bucket
//! 4. concatenate buckets in quota order
//! 5. stable-sort the merged list newest first
//!
//! Step 5 makes quota order matter only as a tie-break between equal timestamps.
//! Regions with no quota entry contribute nothing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::item::ClassifiedItem;

/// Cap for one region, with the badge text shown next to its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionQuota {
    pub region: String,
    pub count: usize,
    #[serde(default)]
    pub label: Option<String>,
}

/// Ordered region → quota list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionQuotas(Vec<RegionQuota>);

impl RegionQuotas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append (or replace in place) the quota for `region`.
    pub fn with(mut self, region: &str, count: usize, label: Option<&str>) -> Self {
        let q = RegionQuota {
            region: region.to_string(),
            count,
            label: label.map(str::to_string),
        };
        match self.0.iter_mut().find(|e| e.region == region) {
            Some(slot) => *slot = q,
            None => self.0.push(q),
        }
        self
    }

    pub fn get(&self, region: &str) -> Option<&RegionQuota> {
        self.0.iter().find(|q| q.region == region)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionQuota> {
        self.0.iter()
    }

    /// Upper bound on the merged output size.
    pub fn total(&self) -> usize {
        self.0.iter().map(|q| q.count).sum()
    }
}

/// Newest first; stable, so equal timestamps keep their relative order.
pub fn sort_newest_first(items: &mut [ClassifiedItem]) {
    items.sort_by_key(|it| std::cmp::Reverse(it.published_ms()));
}

/// Bucket by region, cap each bucket, merge, re-sort by recency.
pub fn distribute(items: Vec<ClassifiedItem>, quotas: &RegionQuotas) -> Vec<ClassifiedItem> {
    let mut buckets: HashMap<String, Vec<ClassifiedItem>> = HashMap::new();
    for it in items {
        buckets.entry(it.region.clone()).or_default().push(it);
    }

    let mut merged = Vec::with_capacity(quotas.total().min(1024));
    for q in quotas.iter() {
        let Some(mut bucket) = buckets.remove(&q.region) else {
            continue;
        };
        sort_newest_first(&mut bucket);
        bucket.truncate(q.count);
        for mut it in bucket {
            if q.label.is_some() {
                it.region_label = q.label.clone();
            }
            merged.push(it);
        }
    }

    if !buckets.is_empty() {
        tracing::debug!(
            dropped_regions = ?buckets.keys().collect::<Vec<_>>(),
            "regions without quota dropped"
        );
    }

    sort_newest_first(&mut merged);
    merged
}
