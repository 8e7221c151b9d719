//! OpenAI-compatible vision runtime backend.
//!
//! This is the model-side implementation `reelscout serve` wraps: a
//! chat-completions client against a vision runtime (e.g. vLLM serving a
//! Qwen-VL model). Videos are referenced by URL (`file://` for local
//! paths); images are inlined as base64 data URLs.

use super::{InferenceGateway, InferenceRequest, MediaKind, PromptSpec};
use crate::config::OpenAiCompatConfig;
use crate::error::GatewayError;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Chat-completions client for an OpenAI-compatible vision runtime.
pub struct OpenAiCompatRuntime {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_video_pixels: u32,
    fps: f32,
    client: reqwest::Client,
}

impl OpenAiCompatRuntime {
    pub fn new(endpoint: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            max_video_pixels: 360 * 420,
            fps: 1.0,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &OpenAiCompatConfig) -> Self {
        let api_key = super::resolve_env_var(&config.api_key);
        let mut runtime = Self::new(&config.endpoint, api_key, &config.model);
        runtime.max_video_pixels = config.max_video_pixels;
        runtime.fps = config.fps;
        runtime
    }

    /// Turn a media reference into the URL form the runtime expects.
    ///
    /// Remote URLs pass through; local video paths become `file://` URLs
    /// (the runtime must be started with local media access); local images
    /// are inlined as data URLs.
    fn media_url(&self, media: &str, kind: MediaKind) -> Result<String, GatewayError> {
        if media.starts_with("http://") || media.starts_with("https://") {
            return Ok(media.to_string());
        }

        let path = Path::new(media);
        if !path.exists() {
            return Err(GatewayError::FileNotFound(path.to_path_buf()));
        }

        match kind {
            MediaKind::Video => Ok(format!("file://{media}")),
            MediaKind::Image => image_data_url(path),
        }
    }
}

/// Inline a local image file as a base64 data URL.
fn image_data_url(path: &Path) -> Result<String, GatewayError> {
    let bytes = std::fs::read(path).map_err(|e| GatewayError::Gateway {
        message: format!("Failed to read image {path:?}: {e}"),
        status_code: None,
    })?;

    let media_type = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        other => {
            tracing::warn!("Unknown image extension {other:?}, defaulting to image/jpeg");
            "image/jpeg"
        }
    };

    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{media_type};base64,{data}"))
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    mm_processor_kwargs: Option<MmProcessorKwargs>,
}

/// Frame sampling knobs forwarded to the runtime's video preprocessor.
#[derive(Serialize)]
struct MmProcessorKwargs {
    fps: f32,
    max_pixels: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: MediaUrl },
    #[serde(rename = "video_url")]
    VideoUrl { video_url: MediaUrl },
}

#[derive(Serialize)]
struct MediaUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl InferenceGateway for OpenAiCompatRuntime {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.endpoint);
        let mut builder = self.client.get(&url).timeout(Duration::from_secs(5));
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        match builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn describe(&self, request: &InferenceRequest) -> Result<String, GatewayError> {
        let prompt = match &request.prompt {
            PromptSpec::Text(text) => text.clone(),
            PromptSpec::CatalogId(id) => {
                return Err(GatewayError::Gateway {
                    message: format!(
                        "Prompt id {id:?} cannot be resolved by the model runtime — \
                         resolve it against the catalog first"
                    ),
                    status_code: None,
                });
            }
        };

        let media_url = self.media_url(&request.media, request.kind)?;
        let media_part = match request.kind {
            MediaKind::Video => ChatContent::VideoUrl {
                video_url: MediaUrl { url: media_url },
            },
            MediaKind::Image => ChatContent::ImageUrl {
                image_url: MediaUrl { url: media_url },
            },
        };

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_new_tokens,
            mm_processor_kwargs: match request.kind {
                MediaKind::Video => Some(MmProcessorKwargs {
                    fps: self.fps,
                    max_pixels: self.max_video_pixels,
                }),
                MediaKind::Image => None,
            },
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![media_part, ChatContent::Text { text: prompt }],
            }],
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let mut builder = self.client.post(&url).json(&body).timeout(self.timeout());
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let resp = builder.send().await.map_err(|e| GatewayError::Gateway {
            message: format!("Runtime request failed: {e}"),
            status_code: None,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Gateway {
                message: format!("Runtime HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| GatewayError::Gateway {
            message: format!("Failed to parse runtime response: {e}"),
            status_code: None,
        })?;

        let text = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| GatewayError::Gateway {
                message: "Runtime returned empty choices array".to_string(),
                status_code: None,
            })?;

        Ok(text.trim().to_string())
    }

    /// The runtime has no batch API and fronts a single accelerator, so a
    /// batch is a sequential loop. Any item failure fails the whole batch.
    async fn describe_batch(
        &self,
        media: &[String],
        prompt: &PromptSpec,
        max_new_tokens: u32,
    ) -> Result<Vec<String>, GatewayError> {
        let mut results = Vec::with_capacity(media.len());
        for media_ref in media {
            let request = InferenceRequest::video(media_ref.clone(), prompt.clone(), max_new_tokens);
            results.push(self.describe(&request).await?);
        }
        Ok(results)
    }

    fn timeout(&self) -> Duration {
        // Video inference on a single accelerator is slow
        Duration::from_secs(300)
    }
}
