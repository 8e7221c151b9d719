//! Inference gateway contract and implementations.
//!
//! Defines the interface the batch dispatcher and the gateway server speak,
//! plus the two concrete implementations: the REST gateway client and the
//! OpenAI-compatible model runtime it fronts.

pub mod http;
pub mod openai_compat;
pub mod retry;

pub use http::HttpGateway;
pub use openai_compat::OpenAiCompatRuntime;

use crate::error::GatewayError;
use async_trait::async_trait;
use std::time::Duration;

/// How a media reference should be presented to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Sniff the kind from a path or URL extension. Anything that isn't a
    /// recognized image extension is treated as video.
    pub fn from_media(media: &str) -> Self {
        let stripped = media.split('?').next().unwrap_or(media).to_lowercase();
        let is_image = [".jpg", ".jpeg", ".png", ".webp", ".gif"]
            .iter()
            .any(|ext| stripped.ends_with(ext));
        if is_image {
            Self::Image
        } else {
            Self::Video
        }
    }
}

/// The prompt for a call: literal text, or a catalog id the gateway
/// resolves server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSpec {
    Text(String),
    CatalogId(String),
}

impl PromptSpec {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::Text(prompt.into())
    }

    pub fn catalog_id(id: impl Into<String>) -> Self {
        Self::CatalogId(id.into())
    }
}

/// A single inference call: media reference, prompt, generation bound.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Local file path or URL of the media to describe
    pub media: String,

    /// Whether the media is routed as video or image
    pub kind: MediaKind,

    /// Prompt text or catalog id
    pub prompt: PromptSpec,

    /// Generation-length bound
    pub max_new_tokens: u32,
}

impl InferenceRequest {
    /// Build a request, sniffing the media kind from the reference.
    pub fn new(media: impl Into<String>, prompt: PromptSpec, max_new_tokens: u32) -> Self {
        let media = media.into();
        let kind = MediaKind::from_media(&media);
        Self {
            media,
            kind,
            prompt,
            max_new_tokens,
        }
    }

    /// Build a request routed as video regardless of extension.
    pub fn video(media: impl Into<String>, prompt: PromptSpec, max_new_tokens: u32) -> Self {
        Self {
            media: media.into(),
            kind: MediaKind::Video,
            prompt,
            max_new_tokens,
        }
    }

    /// Build a request routed as image regardless of extension.
    pub fn image(media: impl Into<String>, prompt: PromptSpec, max_new_tokens: u32) -> Self {
        Self {
            media: media.into(),
            kind: MediaKind::Image,
            prompt,
            max_new_tokens,
        }
    }
}

/// Trait both gateway implementations fulfill.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn InferenceGateway>` for dynamic dispatch).
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Implementation name for logging (e.g., "http", "openai-compat").
    fn name(&self) -> &str;

    /// Check whether the gateway is configured and reachable.
    async fn is_available(&self) -> bool;

    /// Generate descriptive text for a single media reference.
    async fn describe(&self, request: &InferenceRequest) -> Result<String, GatewayError>;

    /// Generate descriptive text for every reference, positionally aligned
    /// with the input list.
    async fn describe_batch(
        &self,
        media: &[String],
        prompt: &PromptSpec,
        max_new_tokens: u32,
    ) -> Result<Vec<String>, GatewayError>;

    /// Per-request deadline for this implementation.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_sniffing() {
        assert_eq!(MediaKind::from_media("/data/clip.mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_media("/data/avatar.jpg"), MediaKind::Image);
        assert_eq!(MediaKind::from_media("/data/avatar.PNG"), MediaKind::Image);
        assert_eq!(
            MediaKind::from_media("https://cdn.example.com/a.jpeg?x-expires=123"),
            MediaKind::Image
        );
        // No extension defaults to video
        assert_eq!(
            MediaKind::from_media("https://www.tiktok.com/@user/video/123"),
            MediaKind::Video
        );
    }

    #[test]
    fn test_request_kind_override() {
        let request = InferenceRequest::video("poster.jpg", PromptSpec::text("p"), 64);
        assert_eq!(request.kind, MediaKind::Video);

        let request = InferenceRequest::new("poster.jpg", PromptSpec::text("p"), 64);
        assert_eq!(request.kind, MediaKind::Image);
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }
}
