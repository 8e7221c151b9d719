//! Media download: external downloader process for videos, direct HTTP for
//! avatar images.
//!
//! The downloader binary is invoked once per video URL with proxy and
//! user-agent flags; it is expected to place the file at the templated
//! output path. Failures are detected via exit status and a fixed deadline.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Extensions the downloader is expected to produce.
const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".webm", ".mkv"];

/// Settings for video and avatar downloads.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// External downloader binary (yt-dlp compatible flags)
    pub downloader: String,

    /// HTTP proxy passed to the downloader and used for avatar fetches
    pub proxy: Option<String>,

    /// User agent for the downloader and avatar fetches
    pub user_agent: String,

    /// Per-video deadline in milliseconds
    pub timeout_ms: u64,
}

impl DownloadOptions {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            downloader: config.downloader.clone(),
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            timeout_ms: config.download_timeout_ms,
        }
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::from_config(&ScrapeConfig::default())
    }
}

/// Downloads creator media into an output directory.
pub struct Downloader {
    options: DownloadOptions,
    client: reqwest::Client,
}

impl Downloader {
    pub fn new(options: DownloadOptions) -> Self {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent.clone());
        if let Some(proxy_url) = &options.proxy {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!("Ignoring invalid proxy {proxy_url:?}: {e}"),
            }
        }
        let client = builder.build().unwrap_or_default();
        Self { options, client }
    }

    /// Download every video URL, one downloader invocation per item.
    ///
    /// A failed download is logged and skipped; the returned paths cover
    /// the successes only.
    pub async fn download_videos(
        &self,
        urls: &[String],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let mut downloaded = Vec::new();
        for (index, url) in urls.iter().enumerate() {
            tracing::info!("Downloading video {}/{}: {url}", index + 1, urls.len());
            match self.download_one(url, output_dir, index + 1).await {
                Ok(path) => {
                    tracing::info!("Downloaded {}", path.display());
                    downloaded.push(path);
                }
                Err(e) => tracing::error!("Failed to download video {}: {e}", index + 1),
            }
        }

        tracing::info!(
            "Download summary: {}/{} videos downloaded",
            downloaded.len(),
            urls.len()
        );
        Ok(downloaded)
    }

    /// Run the downloader for a single URL and locate its output file.
    async fn download_one(
        &self,
        url: &str,
        output_dir: &Path,
        ordinal: usize,
    ) -> Result<PathBuf, ScrapeError> {
        let template = output_dir.join(format!("video_{ordinal}.%(ext)s"));

        let mut command = Command::new(&self.options.downloader);
        if let Some(proxy) = &self.options.proxy {
            command.arg("--proxy").arg(proxy);
        }
        command
            .arg("--user-agent")
            .arg(&self.options.user_agent)
            .arg("-o")
            .arg(&template)
            .arg(url)
            .kill_on_drop(true);

        let deadline = Duration::from_millis(self.options.timeout_ms);
        let output = match tokio::time::timeout(deadline, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ScrapeError::Download {
                    url: url.to_string(),
                    message: format!("failed to run {}: {e}", self.options.downloader),
                });
            }
            // kill_on_drop reaps the child when the timed-out future drops
            Err(_) => {
                return Err(ScrapeError::DownloadTimeout {
                    url: url.to_string(),
                    timeout_ms: self.options.timeout_ms,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScrapeError::Download {
                url: url.to_string(),
                message: stderr.trim().to_string(),
            });
        }

        find_downloaded(output_dir, ordinal).ok_or_else(|| ScrapeError::Download {
            url: url.to_string(),
            message: "downloader exited successfully but no output file was found".to_string(),
        })
    }

    /// Download the creator's avatar image over HTTP.
    pub async fn download_avatar(
        &self,
        avatar_url: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, ScrapeError> {
        tokio::fs::create_dir_all(output_dir).await?;
        let file_path = output_dir.join(format!("avatar{}", avatar_extension(avatar_url)));

        tracing::info!("Downloading avatar from {avatar_url}");
        let resp = self
            .client
            .get(avatar_url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ScrapeError::Download {
                url: avatar_url.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ScrapeError::Download {
                url: avatar_url.to_string(),
                message: format!("HTTP {}", resp.status()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ScrapeError::Download {
            url: avatar_url.to_string(),
            message: e.to_string(),
        })?;
        tokio::fs::write(&file_path, &bytes).await?;

        Ok(file_path)
    }
}

/// Locate the file the downloader produced for a given ordinal.
fn find_downloaded(output_dir: &Path, ordinal: usize) -> Option<PathBuf> {
    let prefix = format!("video_{ordinal}.");
    for entry in std::fs::read_dir(output_dir).ok()?.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && VIDEO_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return Some(entry.path());
        }
    }
    None
}

/// File extension for an avatar URL, defaulting to `.jpg`.
fn avatar_extension(url: &str) -> String {
    let stripped = url.split('?').next().unwrap_or(url);
    let name = stripped.rsplit('/').next().unwrap_or(stripped);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 5 => format!(".{ext}"),
        _ => ".jpg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_extension() {
        assert_eq!(
            avatar_extension("https://cdn.example.com/pic.jpeg?x-expires=1"),
            ".jpeg"
        );
        assert_eq!(avatar_extension("https://cdn.example.com/pic.webp"), ".webp");
        assert_eq!(avatar_extension("https://cdn.example.com/pic"), ".jpg");
        // Dots in path segments don't count as extensions
        assert_eq!(avatar_extension("https://cdn.v2.example.com/pic"), ".jpg");
    }

    #[test]
    fn test_find_downloaded_matches_ordinal_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("video_1.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("video_12.webm"), b"x").unwrap();
        std::fs::write(dir.path().join("video_2.part"), b"x").unwrap();

        let found = find_downloaded(dir.path(), 1).unwrap();
        assert!(found.ends_with("video_1.mp4"));

        let found = find_downloaded(dir.path(), 12).unwrap();
        assert!(found.ends_with("video_12.webm"));

        // Incomplete download is not picked up
        assert!(find_downloaded(dir.path(), 2).is_none());
        assert!(find_downloaded(dir.path(), 3).is_none());
    }

    #[tokio::test]
    async fn test_missing_downloader_binary_is_captured() {
        let options = DownloadOptions {
            downloader: "definitely-not-a-real-downloader".to_string(),
            proxy: None,
            user_agent: "test".to_string(),
            timeout_ms: 5000,
        };
        let downloader = Downloader::new(options);
        let dir = tempfile::tempdir().unwrap();

        let err = downloader
            .download_one("https://example.com/v/1", dir.path(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Download { .. }));
    }

    #[tokio::test]
    async fn test_failed_downloads_are_skipped_not_fatal() {
        let options = DownloadOptions {
            downloader: "definitely-not-a-real-downloader".to_string(),
            proxy: None,
            user_agent: "test".to_string(),
            timeout_ms: 5000,
        };
        let downloader = Downloader::new(options);
        let dir = tempfile::tempdir().unwrap();

        let urls = vec![
            "https://example.com/v/1".to_string(),
            "https://example.com/v/2".to_string(),
        ];
        let downloaded = downloader.download_videos(&urls, dir.path()).await.unwrap();
        assert!(downloaded.is_empty());
    }
}
