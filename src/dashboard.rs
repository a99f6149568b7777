// src/dashboard.rs
//! Page-level views composed from the raw feeds.
//!
//! Every view freshness-filters its inputs first. All functions are pure
//! transforms of `(feeds, settings, now_ms)`; nothing here touches the cache.

use serde::Serialize;

use crate::bucketing::distribute;
use crate::classify::{self, Classifier, KeywordFilter};
use crate::config::settings::{Settings, AI_SECTION, TECHNOLOGY_SECTION};
use crate::consensus::fold_consensus;
use crate::freshness::{filter_fresh, retain_fresh, time_ago, Staleness};
use crate::item::{ClassifiedItem, Feeds, NewsItem, SentimentLabel};
use crate::scoring::{is_trending, rank_top_stories, RankingWeights};
use crate::source_weights::SourceWeightsConfig;
use crate::telemetry::{dev_logging_enabled, truncate_vec};

// feed names as pushed by the fetch layer
pub const SOCIAL_FEED: &str = "social";
pub const WORLD_FEED: &str = "world";
pub const INDIA_FEED: &str = "india";
pub const CHENNAI_FEED: &str = "chennai";
pub const LOCAL_FEED: &str = "local";
pub const ENTERTAINMENT_FEED: &str = "entertainment";
pub const TECHNOLOGY_FEED: &str = "technology";

pub const ENTERTAINMENT_TABS: [&str; 4] =
    [classify::TAMIL, classify::HINDI, classify::HOLLYWOOD, classify::OTT];

fn feed<'a>(feeds: &'a Feeds, name: &str) -> &'a [NewsItem] {
    feeds.get(name).map(Vec::as_slice).unwrap_or(&[])
}

fn classifier(settings: &Settings, name: &str, fallback: fn() -> Classifier) -> Classifier {
    settings.classifier(name).unwrap_or_else(|e| {
        tracing::warn!(error = ?e, classifier = name, "invalid classifier override, using preset");
        fallback()
    })
}

fn filter(settings: &Settings, name: &str, fallback: fn() -> KeywordFilter) -> KeywordFilter {
    settings.filter(name).unwrap_or_else(fallback)
}

fn tag(mut item: NewsItem, feed_name: &str, region: &str) -> ClassifiedItem {
    item.source = feed_name.to_string();
    ClassifiedItem::new(item, region)
}

/* ----------------------------
Social trends
---------------------------- */

/// Regional social-trends strip.
///
/// - `social` items are classified tamilnadu → muscat → india → world
/// - `world` / `india` items join their bucket only if the title is trend-ish
/// - every `chennai` item joins tamilnadu, every `local` item joins muscat
///
/// `source` is rewritten to the feed the item came from; buckets are then
/// capped by the social quotas and merged newest first.
pub fn social_trends(feeds: &Feeds, settings: &Settings, now_ms: i64) -> Vec<ClassifiedItem> {
    let limit = settings.freshness_limit_hours;
    let regions = classifier(settings, "social_regions", classify::social_regions);
    let trend = filter(settings, "trend_titles", classify::trend_titles);

    let mut pool = Vec::new();

    for it in filter_fresh(feed(feeds, SOCIAL_FEED), limit, now_ms) {
        let Some(region) = regions.classify(&it).map(str::to_string) else {
            continue;
        };
        pool.push(tag(it, SOCIAL_FEED, &region));
    }

    for (feed_name, region) in [(WORLD_FEED, classify::WORLD), (INDIA_FEED, classify::INDIA)] {
        pool.extend(
            filter_fresh(feed(feeds, feed_name), limit, now_ms)
                .into_iter()
                .filter(|it| trend.matches(it))
                .map(|it| tag(it, feed_name, region)),
        );
    }

    for (feed_name, region) in [
        (CHENNAI_FEED, classify::TAMILNADU),
        (LOCAL_FEED, classify::MUSCAT),
    ] {
        pool.extend(
            filter_fresh(feed(feeds, feed_name), limit, now_ms)
                .into_iter()
                .map(|it| tag(it, feed_name, region)),
        );
    }

    let out = distribute(pool, &settings.social_quotas());

    if dev_logging_enabled() {
        let regions: Vec<&str> = out.iter().map(|c| c.region.as_str()).collect();
        tracing::info!(
            target: "dashboard",
            count = out.len(),
            head = ?truncate_vec(&regions, 5),
            "social trends distributed"
        );
    }

    out
}

/* ----------------------------
Entertainment
---------------------------- */

/// Items of one entertainment tab (`tamil`, `hindi`, `hollywood`, `ott`), feed
/// order, capped at `entertainment_tab_count`. Unknown tabs are empty.
pub fn entertainment_tab(
    feeds: &Feeds,
    tab: &str,
    settings: &Settings,
    now_ms: i64,
) -> Vec<ClassifiedItem> {
    let c = classifier(settings, "entertainment", classify::entertainment);
    let fresh = filter_fresh(feed(feeds, ENTERTAINMENT_FEED), settings.freshness_limit_hours, now_ms);
    c.label_all(fresh)
        .into_iter()
        .filter(|ci| ci.region == tab)
        .take(settings.entertainment_tab_count)
        .collect()
}

/* ----------------------------
Sections
---------------------------- */

/// Display badges for one card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badges {
    pub breaking: bool,
    /// Never set together with `breaking`.
    pub trending: bool,
    /// Present only when more than one source reported the story.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_sources: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentLabel>,
    pub time_ago: String,
    pub staleness: Staleness,
}

impl Badges {
    pub fn for_item(item: &NewsItem, weights: &RankingWeights, now_ms: i64) -> Self {
        Self {
            breaking: item.is_breaking,
            trending: is_trending(item, weights),
            consensus_sources: Some(item.sources()).filter(|n| *n > 1),
            sentiment: item.sentiment.as_ref().map(|s| s.label),
            time_ago: time_ago(item.published_at, now_ms),
            staleness: Staleness::for_timestamp(item.published_at, now_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgedItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub badges: Badges,
}

/// First `max_display` items plus how many more there are.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub visible: Vec<BadgedItem>,
    pub hidden_count: usize,
}

pub fn section_view(
    items: Vec<NewsItem>,
    max_display: usize,
    weights: &RankingWeights,
    now_ms: i64,
) -> SectionView {
    let hidden_count = items.len().saturating_sub(max_display);
    let visible = items
        .into_iter()
        .take(max_display)
        .map(|item| BadgedItem {
            badges: Badges::for_item(&item, weights, now_ms),
            item,
        })
        .collect();
    SectionView {
        visible,
        hidden_count,
    }
}

/// Fresh technology items, `sections.technology.count` visible.
pub fn tech_section(feeds: &Feeds, settings: &Settings, now_ms: i64) -> SectionView {
    let items = filter_fresh(feed(feeds, TECHNOLOGY_FEED), settings.freshness_limit_hours, now_ms);
    section_view(
        items,
        settings.section_count(TECHNOLOGY_SECTION),
        &settings.ranking_weights,
        now_ms,
    )
}

/// Fresh technology items with AI-ish titles, `sections.ai.count` visible.
pub fn ai_innovation_section(feeds: &Feeds, settings: &Settings, now_ms: i64) -> SectionView {
    let ai = filter(settings, "ai_innovation", classify::ai_innovation);
    let items = retain_fresh(
        ai.apply(feed(feeds, TECHNOLOGY_FEED)),
        settings.freshness_limit_hours,
        now_ms,
    );
    section_view(
        items,
        settings.section_count(AI_SECTION),
        &settings.ranking_weights,
        now_ms,
    )
}

/* ----------------------------
Top stories
---------------------------- */

/// Fresh items, near-duplicates folded into one story, then ranked by impact.
pub fn top_stories(
    items: &[NewsItem],
    settings: &Settings,
    sources: &SourceWeightsConfig,
    now_ms: i64,
) -> Vec<NewsItem> {
    let fresh = filter_fresh(items, settings.freshness_limit_hours, now_ms);
    let folded = fold_consensus(fresh, &settings.consensus);
    rank_top_stories(&folded, &settings.ranking_weights, sources, now_ms)
}
