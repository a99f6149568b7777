// src/classify.rs
//! Keyword classifier: ordered keyword groups, first match wins.
//!
//! An item's haystack is `lowercase(title + " " + summary)`. Groups are tested in
//! declaration order and the first group with ANY substring hit decides the label.
//! Match count and keyword specificity play no part; group order *is* the priority.
//! Items matching nothing get the classifier's default label, or none.
//!
//! Presets carry the keyword lists the dashboard ships with; every preset can be
//! replaced from settings (`[classifiers.<name>]`).

use anyhow::bail;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::item::{ClassifiedItem, NewsItem};

/* ----------------------------
Config schema
---------------------------- */

/// One priority slot: a label and the substrings that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// First keyword of this group found in `haystack` (already lower-cased).
    fn first_hit<'a>(&'a self, haystack: &str) -> Option<&'a str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|k| haystack.contains(k))
    }
}

/// Deserializable classifier definition (TOML/JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Label for items no group matches. `None` leaves them unclassified.
    #[serde(default)]
    pub default: Option<String>,
    /// Priority-ordered groups. Earlier groups win.
    pub groups: Vec<KeywordGroup>,
    /// Groups documented for reference but never tested; they never decide.
    #[serde(default)]
    pub reference_groups: Vec<KeywordGroup>,
}

/* ----------------------------
Engine
---------------------------- */

/// Label plus the keyword that decided it (`None` when the default applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    pub label: &'a str,
    pub keyword: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    groups: Vec<KeywordGroup>,
    reference_groups: Vec<KeywordGroup>,
    default: Option<String>,
}

impl Classifier {
    /// Build from a config, lower-casing keywords and dropping blanks.
    /// Rejects blank labels and groups that end up with no keywords.
    pub fn from_config(cfg: ClassifierConfig) -> anyhow::Result<Self> {
        let clean = |groups: Vec<KeywordGroup>| -> anyhow::Result<Vec<KeywordGroup>> {
            groups
                .into_iter()
                .map(|g| {
                    let label = g.label.trim().to_string();
                    if label.is_empty() {
                        bail!("keyword group with empty label");
                    }
                    let keywords: Vec<String> = g
                        .keywords
                        .iter()
                        .map(|k| k.trim().to_lowercase())
                        .filter(|k| !k.is_empty())
                        .collect();
                    if keywords.is_empty() {
                        bail!("keyword group `{label}` has no keywords");
                    }
                    Ok(KeywordGroup { label, keywords })
                })
                .collect()
        };

        let default = cfg
            .default
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            groups: clean(cfg.groups)?,
            reference_groups: clean(cfg.reference_groups)?,
            default,
        })
    }

    /// Parse a classifier from TOML (`default = "..."` + `[[groups]]`).
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: ClassifierConfig = toml::from_str(s)?;
        Self::from_config(cfg)
    }

    pub fn groups(&self) -> &[KeywordGroup] {
        &self.groups
    }

    pub fn reference_groups(&self) -> &[KeywordGroup] {
        &self.reference_groups
    }

    pub fn default_label(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// All labels this classifier can emit, priority order, default last.
    pub fn labels(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.groups.iter().map(|g| g.label.as_str()).collect();
        if let Some(d) = self.default.as_deref() {
            if !out.contains(&d) {
                out.push(d);
            }
        }
        out
    }

    /// Classify a pre-lowered haystack.
    pub fn classify_text<'a>(&'a self, haystack: &str) -> Option<Classification<'a>> {
        for g in &self.groups {
            if let Some(k) = g.first_hit(haystack) {
                return Some(Classification {
                    label: g.label.as_str(),
                    keyword: Some(k),
                });
            }
        }
        self.default.as_deref().map(|d| Classification {
            label: d,
            keyword: None,
        })
    }

    /// Label for an item, first matching group wins.
    pub fn classify(&self, item: &NewsItem) -> Option<&str> {
        self.classify_text(&item.haystack()).map(|c| c.label)
    }

    /// Classify every item; items that get no label are dropped.
    pub fn label_all<I>(&self, items: I) -> Vec<ClassifiedItem>
    where
        I: IntoIterator<Item = NewsItem>,
    {
        items
            .into_iter()
            .filter_map(|it| {
                let label = self.classify(&it)?.to_string();
                Some(ClassifiedItem::new(it, label))
            })
            .collect()
    }
}

/* ----------------------------
Topical filters
---------------------------- */

/// Which part of the item a [`KeywordFilter`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    #[default]
    Title,
    TitleAndSummary,
}

/// Any-substring filter, e.g. "titles mentioning trend/viral/social".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFilter {
    #[serde(default)]
    pub field: MatchField,
    pub keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn title(keywords: &[&str]) -> Self {
        Self {
            field: MatchField::Title,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, item: &NewsItem) -> bool {
        let hay = match self.field {
            MatchField::Title => item.title.to_lowercase(),
            MatchField::TitleAndSummary => item.haystack(),
        };
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && hay.contains(&k.to_lowercase()))
    }

    /// Keep matching items, preserving order.
    pub fn apply(&self, items: &[NewsItem]) -> Vec<NewsItem> {
        items.iter().filter(|it| self.matches(it)).cloned().collect()
    }
}

/* ----------------------------
Presets
---------------------------- */

pub const TAMIL: &str = "tamil";
pub const HINDI: &str = "hindi";
pub const HOLLYWOOD: &str = "hollywood";
pub const OTT: &str = "ott";

pub const WORLD: &str = "world";
pub const INDIA: &str = "india";
pub const TAMILNADU: &str = "tamilnadu";
pub const MUSCAT: &str = "muscat";

static ENTERTAINMENT: Lazy<Classifier> = Lazy::new(|| Classifier {
    groups: vec![
        KeywordGroup::new(
            TAMIL,
            &[
                "vijay", "ajith", "rajini", "kamal", "dhanush", "suriya", "vikram", "simbu",
                "siva karthikeyan", "trisha", "nayanthara", "anirudh", "ar rahman", "kollywood",
                "thalapathy", "thala", "udhayanidhi", "vetri maaran", "lokesh", "nelson",
                "jailer", "leo", "kanguva", "indian 2", "vettaiyan", "goat", "viduthalai",
                "karthi", "sethupathi", "tamil", "chennai",
            ],
        ),
        KeywordGroup::new(
            HINDI,
            &[
                "shah rukh", "srk", "salman", "aamir", "ranbir", "alia", "deepika", "ranveer",
                "kareena", "akshay", "bachchan", "bollywood", "hrithik", "katrina",
                "vicky kaushal", "karan johar", "yrf", "dharma", "pathaan", "jawan", "tiger 3",
                "animal", "dunki", "war 2", "singham", "hindi", "mumbai",
            ],
        ),
        KeywordGroup::new(
            HOLLYWOOD,
            &[
                "oscar", "grammy", "emmy", "golden globe", "marvel", "dc", "disney",
                "warner bros", "universal", "tom cruise", "dicaprio", "nolan", "avengers",
                "spider-man", "batman", "superman", "taylor swift", "beyonce", "kim kardashian",
                "kanye", "justin bieber", "selena gomez", "zendaya", "hollywood", "bad bunny",
                "rihanna", "drake",
            ],
        ),
        KeywordGroup::new(
            OTT,
            &[
                "netflix", "prime video", "hotstar", "sonyliv", "zee5", "aha", "streaming",
                "web series", "season", "episode", "ott",
            ],
        ),
    ],
    reference_groups: Vec::new(),
    default: None,
});

static SOCIAL_REGIONS: Lazy<Classifier> = Lazy::new(|| Classifier {
    groups: vec![
        KeywordGroup::new(
            TAMILNADU,
            &[
                "chennai", "tamil", "tamilnadu", "kollywood", "rajini", "kamal", "vijay",
                "trichy", "coimbatore", "madurai", "tn",
            ],
        ),
        KeywordGroup::new(
            MUSCAT,
            &[
                "muscat", "oman", "gulf", "gcc", "uae", "dubai", "arab", "middle east", "expat",
                "omani",
            ],
        ),
        KeywordGroup::new(
            INDIA,
            &[
                "india", "indian", "bollywood", "cricket", "modi", "delhi", "mumbai",
                "bangalore", "hyderabad", "ipl", "bcci",
            ],
        ),
    ],
    reference_groups: vec![KeywordGroup::new(
        WORLD,
        &[
            "global", "world", "international", "usa", "europe", "uk", "china", "twitter",
            "x.com", "meta", "tiktok", "instagram", "viral",
        ],
    )],
    default: Some(WORLD.to_string()),
});

/// tamil → hindi → hollywood → ott; unmatched items stay unclassified.
pub fn entertainment() -> Classifier {
    ENTERTAINMENT.clone()
}

/// tamilnadu → muscat → india; everything else is `world`.
pub fn social_regions() -> Classifier {
    SOCIAL_REGIONS.clone()
}

/// Preset by name (`entertainment`, `social_regions`).
pub fn preset(name: &str) -> Option<Classifier> {
    match name {
        "entertainment" => Some(entertainment()),
        "social_regions" | "social" => Some(social_regions()),
        _ => None,
    }
}

/// Titles about trends: picks trend-ish items out of the world/india feeds.
pub fn trend_titles() -> KeywordFilter {
    KeywordFilter::title(&["trend", "viral", "social"])
}

/// Titles for the AI & innovation strip of the technology feed.
pub fn ai_innovation() -> KeywordFilter {
    KeywordFilter::title(&["ai", "innovation", "machine learning", "chatgpt", "gemini"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, summary: Option<&str>) -> NewsItem {
        NewsItem {
            title: title.into(),
            summary: summary.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn first_group_wins_over_match_count() {
        // Matches hindi three times and tamil once; tamil is declared first.
        let it = item("Salman, Ranbir and Deepika at Chennai premiere", None);
        assert_eq!(entertainment().classify(&it), Some(TAMIL));
    }

    #[test]
    fn summary_participates_in_matching() {
        let it = item("Weekend box office", Some("Netflix drops a new season"));
        assert_eq!(entertainment().classify(&it), Some(OTT));
    }

    #[test]
    fn unmatched_entertainment_stays_unclassified() {
        let it = item("Local theatre reopens", None);
        assert_eq!(entertainment().classify(&it), None);
    }

    #[test]
    fn social_default_is_world() {
        let it = item("Stocks rally in Frankfurt", None);
        assert_eq!(social_regions().classify(&it), Some(WORLD));
    }

    #[test]
    fn reference_world_group_never_decides() {
        // "viral" is a world keyword but "india" is a real group → india.
        let it = item("Viral video from India", None);
        assert_eq!(social_regions().classify(&it), Some(INDIA));
        assert_eq!(social_regions().reference_groups()[0].label, WORLD);
    }

    #[test]
    fn tamilnadu_before_muscat_before_india() {
        let c = social_regions();
        assert_eq!(c.classify(&item("Chennai expats in Oman", None)), Some(TAMILNADU));
        assert_eq!(c.classify(&item("Indian expats in Oman", None)), Some(MUSCAT));
    }

    #[test]
    fn substring_semantics_are_kept() {
        // "tn" is a substring match, not a word match.
        let it = item("Huge crowd in Patna", None);
        assert_eq!(social_regions().classify(&it), Some(TAMILNADU));
    }

    #[test]
    fn every_preset_group_is_reachable() {
        // Table-driven: the first keyword of each group classifies to that group
        // when nothing earlier matches.
        let cases: &[(&str, &str, Classifier)] = &[
            ("Vijay new film", TAMIL, entertainment()),
            ("Shah Rukh returns", HINDI, entertainment()),
            ("Oscar nominations out", HOLLYWOOD, entertainment()),
            ("Netflix price hike", OTT, entertainment()),
            ("Chennai rains", TAMILNADU, social_regions()),
            ("Muscat festival", MUSCAT, social_regions()),
            ("India wins toss", INDIA, social_regions()),
            ("Quiet day", WORLD, social_regions()),
        ];
        for (title, want, c) in cases {
            assert_eq!(c.classify(&item(title, None)), Some(*want), "title: {title}");
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let c = social_regions();
        let it = item("Dubai and Delhi both trend", None);
        let a = c.classify(&it).map(str::to_string);
        for _ in 0..10 {
            assert_eq!(c.classify(&it).map(str::to_string), a);
        }
    }

    #[test]
    fn classification_reports_keyword() {
        let c = social_regions();
        let got = c.classify_text("rain in madurai").unwrap();
        assert_eq!(got.label, TAMILNADU);
        assert_eq!(got.keyword, Some("madurai"));
        let dflt = c.classify_text("nothing here").unwrap();
        assert_eq!(dflt.keyword, None);
    }

    #[test]
    fn label_all_drops_unlabelled() {
        let out = entertainment().label_all(vec![
            item("Leo sequel confirmed", None),
            item("Weather update", None),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].region, TAMIL);
    }

    #[test]
    fn toml_config_lowercases_and_validates() {
        let c = Classifier::from_toml_str(
            r#"
default = "other"

[[groups]]
label = "sports"
keywords = ["Cricket", " IPL ", ""]

[[groups]]
label = "tech"
keywords = ["ai"]
"#,
        )
        .unwrap();
        assert_eq!(c.labels(), vec!["sports", "tech", "other"]);
        assert_eq!(c.groups()[0].keywords, vec!["cricket", "ipl"]);
        assert_eq!(c.classify(&item("IPL auction and AI", None)), Some("sports"));
        assert_eq!(c.default_label(), Some("other"));
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = Classifier::from_toml_str(
            r#"
[[groups]]
label = "x"
keywords = ["  "]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no keywords"));
    }

    #[test]
    fn filters_match_titles_only_by_default() {
        let f = trend_titles();
        assert!(f.matches(&item("What is trending now", None)));
        assert!(!f.matches(&item("Budget speech", Some("social media reacts"))));

        let ai = ai_innovation();
        assert!(ai.matches(&item("Gemini update ships", None)));
        assert_eq!(ai.apply(&[item("ChatGPT", None), item("Budget", None)]).len(), 1);
    }

    #[test]
    fn preset_lookup() {
        assert!(preset("entertainment").is_some());
        assert!(preset("social").is_some());
        assert!(preset("weather").is_none());
    }
}
