//! reelscout-core — creator scouting pipeline library.
//!
//! Takes creator media (scraped or supplied) through a vision-language
//! inference gateway and turns the generated text into tags for influencer
//! matching.
//!
//! # Architecture
//!
//! ```text
//! Creator URL → Scrape/Download → Batch Dispatch → Gateway → Text
//!                                                              ↓
//!                        Influencer Matcher ← Tags ← Tag Extractor
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use reelscout_core::{BatchDispatcher, DispatchOptions, HttpGateway, PromptSpec};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = Arc::new(HttpGateway::new("http://localhost:5000", 300_000, 600_000));
//!     let dispatcher = BatchDispatcher::new(gateway, DispatchOptions::default());
//!     let report = dispatcher
//!         .dispatch_each(&media, &PromptSpec::catalog_id("3"), 1024, |_| {})
//!         .await;
//!     println!("{} succeeded", report.succeeded());
//! }
//! ```

// Module declarations
pub mod config;
pub mod discover;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod matching;
pub mod output;
pub mod prompts;
pub mod scrape;
pub mod tags;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use dispatch::{BatchDispatcher, DispatchOptions};
pub use error::{ConfigError, GatewayError, GatewayResult, ReelError, Result, ScrapeError};
pub use gateway::{
    HttpGateway, InferenceGateway, InferenceRequest, MediaKind, OpenAiCompatRuntime, PromptSpec,
};
pub use matching::{match_influencers, sort_influencers, AttrValue, Influencer};
pub use output::{OutputFormat, OutputWriter};
pub use prompts::{PromptCatalog, PromptEntry, DEFAULT_PROMPT_ID};
pub use scrape::{CreatorClient, DownloadOptions, Downloader};
pub use tags::{extract_tags, filter_user_input};
pub use types::{BatchReport, CreatorAssets, CreatorPosts, ItemReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
