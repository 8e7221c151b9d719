//! Core data types for the reelscout pipeline.
//!
//! These types represent the per-item and per-batch results of dispatching
//! media through the inference gateway, plus creator-level scrape output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one inference call, paired with its originating media
/// reference. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    /// The media reference this outcome belongs to
    pub media: String,

    /// Whether the call produced text
    pub success: bool,

    /// Generated text on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Human-readable failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemReport {
    /// Successful outcome carrying generated text.
    pub fn success(media: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            media: media.into(),
            success: true,
            result: Some(text.into()),
            error: None,
        }
    }

    /// Failed outcome carrying a reason. Never panics, never propagates.
    pub fn failure(media: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            media: media.into(),
            success: false,
            result: None,
            error: Some(reason.into()),
        }
    }
}

/// Ordered result set of a batch dispatch, positionally aligned with the
/// input media list. Serializes as a bare JSON array of items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// Mark every input reference failed with the same reason — the
    /// batched-mode failure policy.
    pub fn uniform_failure(media: &[String], reason: &str) -> Self {
        Self {
            items: media
                .iter()
                .map(|m| ItemReport::failure(m.clone(), reason))
                .collect(),
        }
    }

    /// Number of successful items.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.success).count()
    }

    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|item| !item.success).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Post listing for a creator, as resolved by the scraping API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorPosts {
    /// Video page URLs, newest first
    pub video_urls: Vec<String>,

    /// Profile image URL (may be empty)
    pub avatar_url: String,

    /// Creator bio / signature text
    pub signature: String,
}

/// Everything fetched for one creator: local media plus profile metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorAssets {
    /// Absolute paths of downloaded videos
    pub video_paths: Vec<PathBuf>,

    /// Absolute path of the downloaded avatar, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<PathBuf>,

    /// Creator bio / signature text
    pub signature: String,
}
