//! Influencer records and tag-based matching and sorting.
//!
//! Matching is exact, case-sensitive set intersection against the union of
//! creator hashtags and model-derived video tags. Sorting is a stable sort
//! over a typed numeric attribute.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A typed attribute value: numeric attributes sort and filter; text
/// attributes ride along for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Numeric view of the value; text values have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }
}

/// An influencer record: identity, open typed attributes, and two tag
/// pools — creator-supplied hashtags and model-derived video tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Open attribute mapping (follower count, exposure, budget, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,

    /// Creator-supplied hashtags
    #[serde(default)]
    pub hashtags: BTreeSet<String>,

    /// Tags derived from analyzed videos; grows append-only
    #[serde(default)]
    pub video_tags: BTreeSet<String>,
}

impl Influencer {
    /// Deduplicated union of hashtags and video tags.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.hashtags.union(&self.video_tags).cloned().collect()
    }

    /// Merge newly extracted video tags into the record. Append-only:
    /// existing tags are never removed.
    pub fn add_video_tags<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.video_tags.extend(tags);
    }

    /// Numeric value of an attribute, defaulting missing or non-numeric
    /// attributes to zero so sorting stays well-defined.
    pub fn numeric_attr(&self, key: &str) -> f64 {
        self.attributes
            .get(key)
            .and_then(AttrValue::as_number)
            .unwrap_or(0.0)
    }
}

/// Return every influencer whose tag set intersects `user_tags`.
///
/// Comparison is exact and case-sensitive; the result preserves input
/// order and is always a subset of the input.
pub fn match_influencers(user_tags: &[String], influencers: &[Influencer]) -> Vec<Influencer> {
    influencers
        .iter()
        .filter(|influencer| {
            let all = influencer.all_tags();
            user_tags.iter().any(|tag| all.contains(tag))
        })
        .cloned()
        .collect()
}

/// Stable sort by the numeric value of `sort_key`, descending by default.
/// Influencers with equal keys keep their relative input order.
pub fn sort_influencers(
    mut influencers: Vec<Influencer>,
    sort_key: &str,
    descending: bool,
) -> Vec<Influencer> {
    influencers.sort_by(|a, b| {
        let (x, y) = (a.numeric_attr(sort_key), b.numeric_attr(sort_key));
        if descending {
            y.total_cmp(&x)
        } else {
            x.total_cmp(&y)
        }
    });
    influencers
}
