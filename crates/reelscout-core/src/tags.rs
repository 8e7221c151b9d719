//! Hashtag extraction from model-generated text.
//!
//! Primary strategy matches `#`-prefixed word tokens; when the model emits
//! none, the text is split on common delimiters instead. Extraction never
//! fails and never deduplicates — callers dedup when merging into an
//! influencer's tag set.

use regex::Regex;
use std::sync::OnceLock;

static HASHTAG: OnceLock<Regex> = OnceLock::new();

fn hashtag_pattern() -> &'static Regex {
    // \w is unicode-aware, so CJK hashtags match too
    HASHTAG.get_or_init(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"))
}

/// Extract tags from generated free text.
///
/// Returns every `#`-prefixed token (minus the `#`) when at least one
/// exists; otherwise falls back to splitting on commas, semicolons, and
/// whitespace, stripping stray `#` and discarding empty pieces.
pub fn extract_tags(text: &str) -> Vec<String> {
    let tags: Vec<String> = hashtag_pattern()
        .find_iter(text)
        .map(|m| m.as_str().trim_start_matches('#').to_string())
        .collect();
    if !tags.is_empty() {
        return tags;
    }

    text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|piece| piece.trim_matches(|c: char| c == '#' || c.is_whitespace()))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turn a free-text user query into match keywords: lowercased,
/// whitespace-split. Matching itself stays exact and case-sensitive.
pub fn filter_user_input(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}
