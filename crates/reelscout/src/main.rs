//! reelscout CLI - creator scouting pipeline.
//!
//! Scrapes creator media, dispatches it through a vision-language gateway,
//! extracts tags from the generated text, and matches influencer records
//! against user-supplied keywords.
//!
//! # Usage
//!
//! ```bash
//! # Describe a batch of videos via the gateway
//! reelscout process ./videos/ --output results.json
//!
//! # Fetch a creator's videos and avatar
//! reelscout scrape https://www.tiktok.com/@someone --output-dir ./videos
//!
//! # Match influencers against keywords
//! reelscout match --input influencers.json 美妆 彩妆 --sort-by followers
//!
//! # Run the gateway in front of a model runtime
//! reelscout serve
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// reelscout - creator scouting pipeline for video tagging and influencer matching.
#[derive(Parser, Debug)]
#[command(name = "reelscout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Dispatch media through the inference gateway and collect a report
    Process(cli::process::ProcessArgs),

    /// Fetch a creator's videos, avatar, and signature
    Scrape(cli::scrape::ScrapeArgs),

    /// Match and sort influencer records against keywords
    Match(cli::matching::MatchArgs),

    /// Serve the gateway REST contract in front of a model runtime
    Serve(cli::serve::ServeArgs),

    /// List the prompt catalog
    Prompts(cli::prompts::PromptsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match reelscout_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `reelscout config path`."
            );
            reelscout_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("reelscout v{}", reelscout_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Scrape(args) => cli::scrape::execute(args, config).await,
        Commands::Match(args) => cli::matching::execute(args, config).await,
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Prompts(args) => cli::prompts::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
