//! The `reelscout match` command: filter and sort influencer records by
//! tag overlap.

use clap::Args;
use reelscout_core::{
    filter_user_input, match_influencers, output, sort_influencers, Config, Influencer,
};
use std::path::PathBuf;

/// Arguments for the `match` command.
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Influencer records as a JSON array
    #[arg(short, long)]
    pub input: PathBuf,

    /// Keywords or free-text query to match against influencer tags
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Attribute to sort the matches by (e.g. "followers", "budget")
    #[arg(short, long)]
    pub sort_by: Option<String>,

    /// Sort ascending instead of the default descending
    #[arg(long)]
    pub ascending: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the match command.
pub async fn execute(args: MatchArgs, config: Config) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.input)?;
    let influencers: Vec<Influencer> = serde_json::from_str(&content)?;
    tracing::info!("Loaded {} influencer records", influencers.len());

    let user_tags = filter_user_input(&args.query.join(" "));
    let mut matched = match_influencers(&user_tags, &influencers);
    tracing::info!("Matched {}/{} influencers", matched.len(), influencers.len());

    if let Some(sort_key) = &args.sort_by {
        matched = sort_influencers(matched, sort_key, !args.ascending);
    }

    let json = output::to_json(&matched, config.output.pretty)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Matches written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_words_become_user_tags() {
        let user_tags = filter_user_input(&["美妆", "彩妆", "预算10000以上"].join(" "));
        assert_eq!(user_tags, vec!["美妆", "彩妆", "预算10000以上"]);
    }
}
