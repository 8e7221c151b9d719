//! Creator resolution via the external scraping API.
//!
//! The narrow interface here is "creator URL → media URLs + profile
//! metadata"; actual media retrieval is delegated to [`download`].

pub mod download;

pub use download::{DownloadOptions, Downloader};

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::types::{CreatorAssets, CreatorPosts};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

static CREATOR_HANDLE: OnceLock<Regex> = OnceLock::new();

/// Extract the handle segment of a creator page URL, used to validate the
/// URL before hitting the API.
pub fn creator_handle(url: &str) -> Option<&str> {
    let pattern = CREATOR_HANDLE
        .get_or_init(|| Regex::new(r"tiktok\.com/([^?]+)").expect("handle pattern is valid"));
    pattern
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Envelope every creator API response is wrapped in.
#[derive(Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    data: Option<T>,
}

/// Post listing payload as the API returns it.
#[derive(Deserialize, Default)]
struct PostsData {
    #[serde(default)]
    video_urls: Vec<String>,
    #[serde(default, rename = "avatarLarger")]
    avatar_larger: String,
    #[serde(default)]
    signature: String,
}

/// Client for the creator resolution API.
pub struct CreatorClient {
    client: reqwest::Client,
    api_domain: String,
}

impl CreatorClient {
    pub fn new(api_domain: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_domain: api_domain.to_string(),
        }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(&config.api_domain)
    }

    /// Resolve a creator page URL to its opaque secUid list.
    pub async fn resolve_sec_uids(&self, creator_url: &str) -> Result<Vec<String>, ScrapeError> {
        if creator_handle(creator_url).is_none() {
            return Err(ScrapeError::InvalidUrl(creator_url.to_string()));
        }

        let api_url = format!(
            "https://{}/api/tiktok/web/get_all_sec_user_id",
            self.api_domain
        );
        let resp = self
            .client
            .post(&api_url)
            .header("accept", "application/json")
            .json(&[creator_url])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ScrapeError::Api {
                message: format!("Network request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Api {
                message: format!("HTTP {status}"),
            });
        }

        let envelope: ApiEnvelope<Vec<String>> =
            resp.json().await.map_err(|e| ScrapeError::Api {
                message: format!("Invalid JSON response: {e}"),
            })?;

        if envelope.code != 200 {
            return Err(ScrapeError::Api {
                message: format!("API returned error code: {}", envelope.code),
            });
        }

        Ok(envelope.data.unwrap_or_default())
    }

    /// Fetch a creator's post listing: video URLs plus profile metadata.
    pub async fn fetch_posts(
        &self,
        sec_uid: &str,
        cursor: &str,
        count: u32,
    ) -> Result<CreatorPosts, ScrapeError> {
        let api_url = format!(
            "https://{}/api/tiktok/web/fetch_user_post_hot_simple",
            self.api_domain
        );
        let resp = self
            .client
            .get(&api_url)
            .header("accept", "application/json")
            .query(&[
                ("secUid", sec_uid),
                ("cursor", cursor),
                ("count", &count.to_string()),
                ("coverFormat", "2"),
            ])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ScrapeError::Api {
                message: format!("Network request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Api {
                message: format!("HTTP {status}"),
            });
        }

        let envelope: ApiEnvelope<PostsData> =
            resp.json().await.map_err(|e| ScrapeError::Api {
                message: format!("Invalid JSON response: {e}"),
            })?;

        if envelope.code != 200 {
            return Err(ScrapeError::Api {
                message: format!("API returned error code: {}", envelope.code),
            });
        }

        let data = envelope.data.unwrap_or_default();

        Ok(CreatorPosts {
            video_urls: data.video_urls,
            avatar_url: data.avatar_larger,
            signature: data.signature,
        })
    }
}

/// Resolve a creator and fetch everything: videos, avatar, signature.
///
/// Individual video download failures are logged and skipped; only
/// resolution failures abort.
pub async fn fetch_creator_assets(
    client: &CreatorClient,
    downloader: &Downloader,
    creator_url: &str,
    output_dir: &Path,
    post_count: u32,
) -> Result<CreatorAssets, ScrapeError> {
    tracing::info!("Processing creator: {creator_url}");

    let sec_uids = client.resolve_sec_uids(creator_url).await?;
    let sec_uid = sec_uids.first().ok_or_else(|| ScrapeError::Api {
        message: format!("No secUid found for {creator_url}"),
    })?;
    tracing::debug!("Resolved secUid: {sec_uid}");

    let posts = client.fetch_posts(sec_uid, "0", post_count).await?;
    tracing::info!("Found {} videos for {creator_url}", posts.video_urls.len());

    let video_paths = downloader
        .download_videos(&posts.video_urls, output_dir)
        .await?;

    let avatar_path = if posts.avatar_url.is_empty() {
        None
    } else {
        match downloader
            .download_avatar(&posts.avatar_url, output_dir)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Avatar download failed: {e}");
                None
            }
        }
    };

    Ok(CreatorAssets {
        video_paths,
        avatar_path,
        signature: posts.signature,
    })
}
