// src/consensus.rs
//! Consensus folding: the same story from several outlets becomes one item.
//!
//! - Titles are reduced to a comparison key (lowercase alphanumerics).
//! - An item joins the first earlier story whose key is at least
//!   `similarity_threshold` similar and whose members, the newcomer included,
//!   all fall within `window_hours` of each other.
//! - The newest member leads the story; `sourceCount` becomes the larger of
//!   "distinct outlets in the story" and any count already reported upstream.
//! - `isBreaking` / `isLive` are OR-ed across members.
//!
//! Similarity: `strsim::normalized_levenshtein` on the comparison keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

use crate::freshness::MS_PER_HOUR;
use crate::item::NewsItem;
use crate::normalize::comparison_key;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusParams {
    /// Similarity in [0.0, 1.0]. Pairs at or above it are the same story.
    pub similarity_threshold: f64,
    /// Max distance between publication times of members, in hours.
    pub window_hours: f64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            window_hours: 6.0,
        }
    }
}

#[derive(Debug)]
struct Story {
    key: String,
    lead: NewsItem,
    earliest_ms: i64,
    latest_ms: i64,
    outlets: BTreeSet<String>,
    reported_count: u32,
    breaking: bool,
    live: bool,
}

impl Story {
    fn new(key: String, item: NewsItem) -> Self {
        let mut outlets = BTreeSet::new();
        let src = item.source.trim().to_lowercase();
        if !src.is_empty() {
            outlets.insert(src);
        }
        Self {
            key,
            reported_count: item.sources(),
            breaking: item.is_breaking,
            live: item.is_live,
            earliest_ms: item.published_ms(),
            latest_ms: item.published_ms(),
            lead: item,
            outlets,
        }
    }

    /// Publication span of the story if `ts` joined it.
    fn span_with(&self, ts: i64) -> i64 {
        self.latest_ms.max(ts).saturating_sub(self.earliest_ms.min(ts))
    }

    fn absorb(&mut self, item: NewsItem) {
        let ts = item.published_ms();
        self.earliest_ms = self.earliest_ms.min(ts);
        self.latest_ms = self.latest_ms.max(ts);
        let src = item.source.trim().to_lowercase();
        if !src.is_empty() {
            self.outlets.insert(src);
        }
        self.reported_count = self.reported_count.max(item.sources());
        self.breaking |= item.is_breaking;
        self.live |= item.is_live;
        if ts > self.lead.published_ms() {
            self.lead = item;
        }
    }

    fn finish(self) -> NewsItem {
        let mut lead = self.lead;
        let distinct = u32::try_from(self.outlets.len()).unwrap_or(u32::MAX).max(1);
        lead.source_count = Some(distinct.max(self.reported_count));
        lead.is_breaking = self.breaking;
        lead.is_live = self.live;
        lead
    }
}

/// Fold near-duplicate headlines. Output keeps the order in which stories first appear.
pub fn fold_consensus(items: Vec<NewsItem>, params: &ConsensusParams) -> Vec<NewsItem> {
    let threshold = params.similarity_threshold.clamp(0.0, 1.0);
    let window_ms = if params.window_hours.is_finite() && params.window_hours >= 0.0 {
        (params.window_hours * MS_PER_HOUR as f64) as i64
    } else {
        0
    };

    let mut stories: Vec<Story> = Vec::with_capacity(items.len());
    let mut folded = 0usize;

    for item in items {
        let key = comparison_key(&item.title);
        if key.is_empty() {
            stories.push(Story::new(key, item));
            continue;
        }

        let ts = item.published_ms();
        let hit = stories.iter_mut().find(|s| {
            !s.key.is_empty()
                && s.span_with(ts) <= window_ms
                && normalized_levenshtein(&s.key, &key) >= threshold
        });

        match hit {
            Some(story) => {
                story.absorb(item);
                folded += 1;
            }
            None => stories.push(Story::new(key, item)),
        }
    }

    if folded > 0 {
        tracing::debug!(folded, stories = stories.len(), "consensus folded duplicates");
    }

    stories.into_iter().map(Story::finish).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn it(title: &str, source: &str, published_at: i64) -> NewsItem {
        NewsItem {
            id: Some(format!("{source}:{title}")),
            title: title.into(),
            source: source.into(),
            published_at: Some(published_at),
            ..Default::default()
        }
    }

    #[test]
    fn near_identical_headlines_fold_into_newest() {
        let items = vec![
            it("Cyclone hits Chennai, schools shut", "The Hindu", NOW - 3 * MS_PER_HOUR),
            it("Cyclone hits Chennai; schools shut!", "NDTV", NOW - MS_PER_HOUR),
            it("Sensex closes higher", "PTI", NOW - 2 * MS_PER_HOUR),
        ];
        let out = fold_consensus(items, &ConsensusParams::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "NDTV");
        assert_eq!(out[0].source_count, Some(2));
        assert_eq!(out[1].source_count, Some(1));
    }

    #[test]
    fn same_outlet_twice_counts_once() {
        let items = vec![
            it("Metro line opens in Muscat", "Times of Oman", NOW - MS_PER_HOUR),
            it("Metro line opens in Muscat", "times of oman", NOW),
        ];
        let out = fold_consensus(items, &ConsensusParams::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_count, Some(1));
    }

    #[test]
    fn outside_window_stays_separate() {
        let items = vec![
            it("Metro line opens in Muscat", "A", NOW - 10 * MS_PER_HOUR),
            it("Metro line opens in Muscat", "B", NOW),
        ];
        assert_eq!(fold_consensus(items, &ConsensusParams::default()).len(), 2);
    }

    #[test]
    fn window_bounds_the_whole_story_not_just_the_lead() {
        let items = vec![
            it("Metro line opens in Muscat", "A", NOW - 10 * MS_PER_HOUR),
            it("Metro line opens in Muscat", "B", NOW - 5 * MS_PER_HOUR),
            it("Metro line opens in Muscat", "C", NOW),
        ];
        let out = fold_consensus(items, &ConsensusParams::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "B");
        assert_eq!(out[0].source_count, Some(2));
        assert_eq!(out[1].source, "C");
        assert_eq!(out[1].source_count, Some(1));
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let items = vec![
            it("Metro line opens in Muscat", "A", i64::MIN),
            it("Metro line opens in Muscat", "B", NOW),
            it("Metro line opens in Muscat", "C", i64::MAX),
        ];
        assert_eq!(fold_consensus(items, &ConsensusParams::default()).len(), 3);

        let items = vec![
            it("Metro line opens in Muscat", "A", i64::MIN),
            it("Metro line opens in Muscat", "B", i64::MIN),
        ];
        assert_eq!(fold_consensus(items, &ConsensusParams::default()).len(), 1);
    }

    #[test]
    fn upstream_count_is_not_lowered() {
        let mut a = it("Rate decision due", "Reuters", NOW);
        a.source_count = Some(5);
        let out = fold_consensus(vec![a], &ConsensusParams::default());
        assert_eq!(out[0].source_count, Some(5));
    }

    #[test]
    fn flags_are_ored() {
        let mut a = it("Quake shakes Delhi", "PTI", NOW - MS_PER_HOUR);
        a.is_breaking = true;
        let mut b = it("Quake shakes Delhi", "NDTV", NOW);
        b.is_live = true;
        let out = fold_consensus(vec![a, b], &ConsensusParams::default());
        assert_eq!(out.len(), 1);
        assert!(out[0].is_breaking && out[0].is_live);
    }

    #[test]
    fn empty_titles_never_fold() {
        let items = vec![it("", "A", NOW), it("", "B", NOW)];
        assert_eq!(fold_consensus(items, &ConsensusParams::default()).len(), 2);
    }

    #[test]
    fn different_stories_stay_apart() {
        let items = vec![
            it("India beat Australia in Perth", "BBC", NOW),
            it("Oman unveils new visa rules", "Gulf News", NOW),
        ];
        assert_eq!(fold_consensus(items, &ConsensusParams::default()).len(), 2);
    }
}
