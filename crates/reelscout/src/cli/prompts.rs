//! The `reelscout prompts` command: list the prompt catalog.

use clap::Args;
use reelscout_core::{output, Config, HttpGateway, PromptCatalog};

/// Arguments for the `prompts` command.
#[derive(Args, Debug)]
pub struct PromptsArgs {
    /// Fetch the catalog from the running gateway instead of the local file
    #[arg(long)]
    pub remote: bool,
}

/// Execute the prompts command.
pub async fn execute(args: PromptsArgs, config: Config) -> anyhow::Result<()> {
    let catalog = if args.remote {
        let gateway = HttpGateway::from_config(&config.gateway);
        gateway.prompts().await?
    } else {
        PromptCatalog::load_from(&config.prompts_file())
    };

    tracing::debug!("Catalog holds {} prompts", catalog.len());
    println!("{}", output::to_json(&catalog, true)?);

    Ok(())
}
