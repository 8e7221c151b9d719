//! The `reelscout scrape` command: creator URL → downloaded videos, avatar,
//! and signature.

use clap::Args;
use reelscout_core::scrape::{self, CreatorClient, DownloadOptions, Downloader};
use reelscout_core::{output, Config};
use std::path::PathBuf;

/// Arguments for the `scrape` command.
#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Creator page URL (e.g. https://www.tiktok.com/@someone)
    pub creator_url: String,

    /// Directory to place videos and the avatar in (defaults to the
    /// configured data directory)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Number of posts to fetch
    #[arg(long)]
    pub count: Option<u32>,

    /// Override the configured download proxy ("none" disables it)
    #[arg(long)]
    pub proxy: Option<String>,
}

/// Execute the scrape command.
pub async fn execute(args: ScrapeArgs, config: Config) -> anyhow::Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
        None => config.data_dir(),
    };
    let count = args.count.unwrap_or(config.scrape.post_count);

    let mut download_options = DownloadOptions::from_config(&config.scrape);
    if let Some(proxy) = &args.proxy {
        download_options.proxy = if proxy == "none" {
            None
        } else {
            Some(proxy.clone())
        };
    }

    let client = CreatorClient::from_config(&config.scrape);
    let downloader = Downloader::new(download_options);

    let assets = scrape::fetch_creator_assets(
        &client,
        &downloader,
        &args.creator_url,
        &output_dir,
        count,
    )
    .await?;

    tracing::info!(
        "Fetched {} videos, avatar: {}",
        assets.video_paths.len(),
        assets.avatar_path.is_some()
    );

    // Asset manifest goes to stdout for piping into `process`
    println!("{}", output::to_json(&assets, true)?);

    Ok(())
}
