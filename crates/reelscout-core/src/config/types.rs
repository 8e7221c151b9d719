//! Sub-configuration structs with defaults matching a stock deployment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where downloaded media and reports land
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/.reelscout/data"),
        }
    }
}

/// Inference gateway endpoint settings (the consumed REST contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the video-to-text gateway
    pub endpoint: String,

    /// Per-item request deadline in milliseconds
    pub request_timeout_ms: u64,

    /// Deadline for the aggregate batch endpoint in milliseconds
    pub batch_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000".to_string(),
            request_timeout_ms: 300_000,
            batch_timeout_ms: 600_000,
        }
    }
}

/// Batch dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Max concurrent gateway calls in per-item mode.
    /// The gateway fronts a single model instance, so this stays at 1
    /// unless the deployment is known to handle concurrent calls.
    pub parallel: usize,

    /// Delay between per-item calls in milliseconds (gateway throttle)
    pub item_delay_ms: u64,

    /// Max retry attempts for transient per-item failures
    pub retry_attempts: u32,

    /// Base backoff delay between retries in milliseconds
    pub retry_delay_ms: u64,

    /// Default generation-length bound
    pub max_new_tokens: u32,

    /// Default prompt id when no custom prompt is supplied
    pub prompt_id: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            parallel: 1,
            item_delay_ms: 1000,
            retry_attempts: 0,
            retry_delay_ms: 1000,
            max_new_tokens: 1024,
            prompt_id: "3".to_string(),
        }
    }
}

/// Prompt catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Path to the prompts JSON file
    pub file: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            file: "~/.reelscout/prompts.json".to_string(),
        }
    }
}

/// Model runtime configurations (the backend `reelscout serve` wraps).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// OpenAI-compatible vision runtime (e.g. a local vLLM deployment)
    pub openai: Option<OpenAiCompatConfig>,
}

/// OpenAI-compatible runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatConfig {
    /// Chat-completions endpoint base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax); empty for unauthenticated
    /// local runtimes
    pub api_key: String,

    /// Model name as served by the runtime
    pub model: String,

    /// Pixel budget per sampled video frame
    pub max_video_pixels: u32,

    /// Frame sampling rate for video inputs
    pub fps: f32,
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1".to_string(),
            api_key: "${REELSCOUT_RUNTIME_API_KEY}".to_string(),
            model: "Qwen/Qwen2.5-VL-32B-Instruct-AWQ".to_string(),
            max_video_pixels: 360 * 420,
            fps: 1.0,
        }
    }
}

/// Creator scraping and download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Domain of the creator resolution API
    pub api_domain: String,

    /// HTTP proxy for media downloads (None disables the proxy)
    pub proxy: Option<String>,

    /// User agent sent to CDNs and passed to the downloader
    pub user_agent: String,

    /// External downloader binary
    pub downloader: String,

    /// Per-video download deadline in milliseconds
    pub download_timeout_ms: u64,

    /// Number of posts to fetch per creator
    pub post_count: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            api_domain: "api.reelscout.local".to_string(),
            proxy: Some("http://127.0.0.1:7890".to_string()),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            downloader: "yt-dlp".to_string(),
            download_timeout_ms: 300_000,
            post_count: 16,
        }
    }
}

/// Gateway server settings (`reelscout serve`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
