//! The `reelscout serve` command: the gateway REST surface in front of a
//! model runtime.
//!
//! Exposes `POST /video_to_text`, `POST /videos_to_text`, `POST /img_to_text`
//! and `GET /prompts`. The runtime backend is an explicitly constructed
//! handle held for the server's lifetime; calls into it are serialized —
//! one accelerator, one model instance.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use reelscout_core::{
    Config, InferenceGateway, InferenceRequest, OpenAiCompatRuntime, PromptCatalog, PromptSpec,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Shared server state: one long-lived runtime backend plus the catalog.
struct AppState {
    backend: Arc<dyn InferenceGateway>,
    catalog: PromptCatalog,
    /// Serializes model access across requests
    model_lock: tokio::sync::Mutex<()>,
}

// --- Wire types ---

#[derive(Deserialize)]
struct VideoToTextBody {
    video_path: Option<String>,
    prompt: Option<String>,
    prompt_id: Option<String>,
    max_new_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct VideosToTextBody {
    #[serde(default)]
    video_paths: Vec<String>,
    prompt: Option<String>,
    prompt_id: Option<String>,
    max_new_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ImgToTextBody {
    image_path: Option<String>,
    prompt: Option<String>,
    prompt_id: Option<String>,
    max_new_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ResultBody {
    result: String,
}

#[derive(Serialize)]
struct ResultsBody {
    results: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

const DEFAULT_MAX_NEW_TOKENS: u32 = 1024;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Local paths must exist; remote URLs are passed through to the runtime.
fn media_exists(media: &str) -> bool {
    media.starts_with("http://") || media.starts_with("https://") || Path::new(media).exists()
}

/// Explicit prompt wins; otherwise the id resolves through the catalog
/// (unknown ids fall back to the default entry).
fn resolve_prompt(catalog: &PromptCatalog, prompt: Option<String>, prompt_id: &str) -> String {
    match prompt {
        Some(text) if !text.is_empty() => text,
        _ => catalog.resolve(prompt_id).to_string(),
    }
}

// --- Handlers ---

async fn video_to_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VideoToTextBody>,
) -> Response {
    let video_path = match body.video_path {
        Some(path) if media_exists(&path) => path,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "video_path is required and must exist.",
            );
        }
    };

    let prompt = resolve_prompt(
        &state.catalog,
        body.prompt,
        body.prompt_id.as_deref().unwrap_or("3"),
    );
    let request = InferenceRequest::video(
        video_path,
        PromptSpec::text(prompt),
        body.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
    );

    let _guard = state.model_lock.lock().await;
    match state.backend.describe(&request).await {
        Ok(result) => (StatusCode::OK, Json(ResultBody { result })).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn videos_to_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VideosToTextBody>,
) -> Response {
    if body.video_paths.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "video_paths is required.");
    }
    if let Some(missing) = body.video_paths.iter().find(|path| !media_exists(path)) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("video path does not exist: {missing}"),
        );
    }

    let prompt = resolve_prompt(
        &state.catalog,
        body.prompt,
        body.prompt_id.as_deref().unwrap_or("3"),
    );
    let max_new_tokens = body.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS);

    // One lock hold for the whole batch keeps items in submission order
    let _guard = state.model_lock.lock().await;
    let mut results = Vec::with_capacity(body.video_paths.len());
    for path in &body.video_paths {
        let request = InferenceRequest::video(
            path.clone(),
            PromptSpec::text(prompt.clone()),
            max_new_tokens,
        );
        match state.backend.describe(&request).await {
            Ok(result) => results.push(result),
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }

    (StatusCode::OK, Json(ResultsBody { results })).into_response()
}

async fn img_to_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImgToTextBody>,
) -> Response {
    let image_path = match body.image_path {
        Some(path) if media_exists(&path) => path,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "image_path is required and must exist.",
            );
        }
    };

    let prompt = resolve_prompt(
        &state.catalog,
        body.prompt,
        body.prompt_id.as_deref().unwrap_or("0"),
    );
    let request = InferenceRequest::image(
        image_path,
        PromptSpec::text(prompt),
        body.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
    );

    let _guard = state.model_lock.lock().await;
    match state.backend.describe(&request).await {
        Ok(result) => (StatusCode::OK, Json(ResultBody { result })).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn list_prompts(State(state): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(state.catalog.clone())).into_response()
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/video_to_text", post(video_to_text))
        .route("/videos_to_text", post(videos_to_text))
        .route("/img_to_text", post(img_to_text))
        .route("/prompts", get(list_prompts))
        .with_state(state)
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let runtime_config = config.runtime.openai.clone().unwrap_or_default();
    let backend: Arc<dyn InferenceGateway> =
        Arc::new(OpenAiCompatRuntime::from_config(&runtime_config));

    if backend.is_available().await {
        tracing::info!("Model runtime at {} is reachable", runtime_config.endpoint);
    } else {
        tracing::warn!(
            "Model runtime at {} not reachable — requests will fail until it comes up",
            runtime_config.endpoint
        );
    }

    let catalog = PromptCatalog::load_from(&config.prompts_file());
    tracing::info!("Loaded {} prompts", catalog.len());

    let state = Arc::new(AppState {
        backend,
        catalog,
        model_lock: tokio::sync::Mutex::new(()),
    });

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Gateway listening at http://{bind_addr} — POST to /video_to_text");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down gateway");
        })
        .await?;

    Ok(())
}
