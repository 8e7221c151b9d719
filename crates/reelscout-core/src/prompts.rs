//! Prompt catalog: id → prompt text mapping backed by a JSON file.
//!
//! The catalog never fails a lookup. Missing files, unreadable JSON, and
//! unknown ids all degrade to the built-in default entry under id "0".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Identifier of the built-in fallback entry. Always present.
pub const DEFAULT_PROMPT_ID: &str = "0";

const DEFAULT_PROMPT_TEXT: &str = "Please analyze this video and provide a description.";

/// A single named prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptEntry {
    /// Human-readable name
    pub name: String,

    /// Prompt body passed to the inference gateway
    pub prompt: String,
}

/// Mapping from prompt id to entry, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptCatalog {
    entries: BTreeMap<String, PromptEntry>,
}

impl PromptCatalog {
    /// Catalog containing only the built-in default entry.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            DEFAULT_PROMPT_ID.to_string(),
            PromptEntry {
                name: "Default".to_string(),
                prompt: DEFAULT_PROMPT_TEXT.to_string(),
            },
        );
        Self { entries }
    }

    /// Load the catalog from a JSON file.
    ///
    /// A missing or unparseable file falls back to [`PromptCatalog::builtin`].
    /// A parsed catalog that lacks the "0" entry gets the built-in default
    /// inserted, so `resolve` always has a fallback target.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "Prompts file {:?} not readable ({e}) — using built-in default",
                    path
                );
                return Self::builtin();
            }
        };

        match serde_json::from_str::<BTreeMap<String, PromptEntry>>(&content) {
            Ok(mut entries) => {
                entries
                    .entry(DEFAULT_PROMPT_ID.to_string())
                    .or_insert_with(|| PromptEntry {
                        name: "Default".to_string(),
                        prompt: DEFAULT_PROMPT_TEXT.to_string(),
                    });
                Self { entries }
            }
            Err(e) => {
                tracing::warn!("Failed to parse prompts file {:?}: {e} — using built-in default", path);
                Self::builtin()
            }
        }
    }

    /// Resolve a prompt id to its text, falling back to the "0" entry for
    /// unknown ids. Never fails.
    pub fn resolve(&self, prompt_id: &str) -> &str {
        self.entries
            .get(prompt_id)
            .or_else(|| self.entries.get(DEFAULT_PROMPT_ID))
            .map(|entry| entry.prompt.as_str())
            .unwrap_or(DEFAULT_PROMPT_TEXT)
    }

    /// Look up a full entry by id (no fallback).
    pub fn get(&self, prompt_id: &str) -> Option<&PromptEntry> {
        self.entries.get(prompt_id)
    }

    /// All entries, for the `GET /prompts` endpoint and CLI listing.
    pub fn entries(&self) -> &BTreeMap<String, PromptEntry> {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
