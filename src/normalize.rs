// src/normalize.rs
//! Text cleanup applied to headlines and summaries as they enter the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::item::NewsItem;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Summaries longer than this are cut (in chars).
const SUMMARY_CAP: usize = 600;

/// Decode entities, strip tags, straighten typographic quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");

    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    RE_WS.replace_all(&quoted, " ").trim().to_string()
}

/// Normalize a whole item in place of the fetch layer's raw text.
/// Empty summaries become `None`; long summaries are capped.
pub fn normalize_item(mut item: NewsItem) -> NewsItem {
    item.title = normalize_text(&item.title);
    item.source = normalize_text(&item.source);
    item.summary = item
        .summary
        .as_deref()
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.chars().count() > SUMMARY_CAP {
                s.chars().take(SUMMARY_CAP).collect()
            } else {
                s
            }
        });
    item
}

/// Key used for near-duplicate comparison: lowercase alphanumerics, single spaces.
pub fn comparison_key(s: &str) -> String {
    let lower = normalize_text(s).to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
