//! REST gateway client — the consumed video-to-text contract.
//!
//! Talks to a running gateway (`reelscout serve` or a compatible deployment)
//! over its JSON endpoints. One long-lived `reqwest::Client` is reused
//! across calls; every call is independently retryable.

use super::{InferenceGateway, InferenceRequest, MediaKind, PromptSpec};
use crate::error::GatewayError;
use crate::prompts::PromptCatalog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for the gateway REST contract.
pub struct HttpGateway {
    endpoint: String,
    client: reqwest::Client,
    request_timeout: Duration,
    batch_timeout: Duration,
}

impl HttpGateway {
    pub fn new(endpoint: &str, request_timeout_ms: u64, batch_timeout_ms: u64) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            request_timeout: Duration::from_millis(request_timeout_ms),
            batch_timeout: Duration::from_millis(batch_timeout_ms),
        }
    }

    pub fn from_config(config: &crate::config::GatewayConfig) -> Self {
        Self::new(
            &config.endpoint,
            config.request_timeout_ms,
            config.batch_timeout_ms,
        )
    }

    /// Fetch the gateway's prompt catalog (`GET /prompts`).
    pub async fn prompts(&self) -> Result<PromptCatalog, GatewayError> {
        let url = format!("{}/prompts", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), resp).await);
        }

        resp.json::<PromptCatalog>()
            .await
            .map_err(|e| GatewayError::Gateway {
                message: format!("Failed to parse prompt catalog: {e}"),
                status_code: None,
            })
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct VideoBody<'a> {
    video_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_id: Option<&'a str>,
    max_new_tokens: u32,
}

#[derive(Serialize)]
struct ImageBody<'a> {
    image_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_id: Option<&'a str>,
    max_new_tokens: u32,
}

#[derive(Serialize)]
struct BatchBody<'a> {
    video_paths: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_id: Option<&'a str>,
    max_new_tokens: u32,
}

#[derive(Deserialize)]
struct ResultBody {
    result: String,
}

#[derive(Deserialize)]
struct ResultsBody {
    results: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Split a prompt spec into the `prompt` / `prompt_id` wire fields.
fn prompt_fields(prompt: &PromptSpec) -> (Option<&str>, Option<&str>) {
    match prompt {
        PromptSpec::Text(text) => (Some(text.as_str()), None),
        PromptSpec::CatalogId(id) => (None, Some(id.as_str())),
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    GatewayError::Gateway {
        message: format!("Gateway request failed: {e}"),
        status_code: None,
    }
}

/// Build a gateway error from a non-success response, preferring the
/// structured `{error}` body over raw text.
async fn error_from_response(status: u16, resp: reqwest::Response) -> GatewayError {
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("HTTP {status}: {text}"));
    GatewayError::Gateway {
        message,
        status_code: Some(status),
    }
}

#[async_trait]
impl InferenceGateway for HttpGateway {
    fn name(&self) -> &str {
        "http"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/prompts", self.endpoint);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn describe(&self, request: &InferenceRequest) -> Result<String, GatewayError> {
        let (prompt, prompt_id) = prompt_fields(&request.prompt);

        let builder = match request.kind {
            MediaKind::Video => {
                let url = format!("{}/video_to_text", self.endpoint);
                self.client.post(&url).json(&VideoBody {
                    video_path: &request.media,
                    prompt,
                    prompt_id,
                    max_new_tokens: request.max_new_tokens,
                })
            }
            MediaKind::Image => {
                let url = format!("{}/img_to_text", self.endpoint);
                self.client.post(&url).json(&ImageBody {
                    image_path: &request.media,
                    prompt,
                    prompt_id,
                    max_new_tokens: request.max_new_tokens,
                })
            }
        };

        let resp = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), resp).await);
        }

        let body: ResultBody = resp.json().await.map_err(|e| GatewayError::Gateway {
            message: format!("Failed to parse gateway response: {e}"),
            status_code: None,
        })?;

        Ok(body.result)
    }

    async fn describe_batch(
        &self,
        media: &[String],
        prompt: &PromptSpec,
        max_new_tokens: u32,
    ) -> Result<Vec<String>, GatewayError> {
        let url = format!("{}/videos_to_text", self.endpoint);
        let (prompt, prompt_id) = prompt_fields(prompt);

        let resp = self
            .client
            .post(&url)
            .json(&BatchBody {
                video_paths: media,
                prompt,
                prompt_id,
                max_new_tokens,
            })
            .timeout(self.batch_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), resp).await);
        }

        let body: ResultsBody = resp.json().await.map_err(|e| GatewayError::Gateway {
            message: format!("Failed to parse gateway batch response: {e}"),
            status_code: None,
        })?;

        Ok(body.results)
    }

    fn timeout(&self) -> Duration {
        self.request_timeout
    }
}
