//! The `reelscout process` command: batch dispatch with progress and a
//! persisted report.

use clap::Args;
use reelscout_core::{
    discover::expand_inputs, BatchDispatcher, BatchReport, Config, DispatchOptions, HttpGateway,
    OutputFormat, OutputWriter, PromptSpec,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Media to process: video/image files, directories, or URLs
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format ("json" or "jsonl")
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Use the aggregate batch endpoint instead of per-item calls
    #[arg(long)]
    pub batched: bool,

    /// Custom prompt applied to every item
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Prompt id from the catalog (used when --prompt is absent)
    #[arg(long)]
    pub prompt_id: Option<String>,

    /// Generation-length bound
    #[arg(long)]
    pub max_new_tokens: Option<u32>,

    /// Delay between per-item calls in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Concurrent gateway calls (keep at 1 unless the gateway allows more)
    #[arg(long)]
    pub parallel: Option<usize>,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let media = expand_inputs(&args.inputs);
    if media.is_empty() {
        anyhow::bail!("No media found in the given inputs");
    }

    let format = OutputFormat::parse(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;

    let prompt = select_prompt(
        args.prompt.as_deref(),
        args.prompt_id.as_deref(),
        &config.dispatch.prompt_id,
    );
    let max_new_tokens = args.max_new_tokens.unwrap_or(config.dispatch.max_new_tokens);

    let mut options = DispatchOptions::from_config(&config.dispatch, &config.gateway);
    if let Some(delay) = args.delay_ms {
        options.item_delay_ms = delay;
    }
    if let Some(parallel) = args.parallel {
        options.parallel = parallel.max(1);
    }

    let gateway = Arc::new(HttpGateway::from_config(&config.gateway));
    let dispatcher = BatchDispatcher::new(gateway, options);

    tracing::info!("Processing {} media references", media.len());
    let start = Instant::now();

    let report = if args.batched {
        dispatcher
            .dispatch_batched(&media, &prompt, max_new_tokens)
            .await
    } else {
        let progress = create_progress_bar(media.len() as u64);
        let pb = progress.clone();
        let report = dispatcher
            .dispatch_each(&media, &prompt, max_new_tokens, move |item| {
                pb.inc(1);
                pb.set_message(item.media.clone());
            })
            .await;
        progress.finish_and_clear();
        report
    };

    write_report(&report, format, config.output.pretty, args.output.as_deref())?;
    print_summary(&report, start.elapsed());

    Ok(())
}

/// Pick the prompt for the run: explicit text wins, then an explicit
/// catalog id, then the configured default id.
fn select_prompt(prompt: Option<&str>, prompt_id: Option<&str>, default_id: &str) -> PromptSpec {
    match (prompt, prompt_id) {
        (Some(text), _) => PromptSpec::text(text),
        (None, Some(id)) => PromptSpec::catalog_id(id),
        (None, None) => PromptSpec::catalog_id(default_id),
    }
}

fn write_report(
    report: &BatchReport,
    format: OutputFormat,
    pretty: bool,
    output: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = OutputWriter::new(BufWriter::new(file), format, pretty);
            writer.write_all(&report.items)?;
            writer.flush()?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = OutputWriter::new(stdout.lock(), format, pretty);
            writer.write_all(&report.items)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Create a progress bar for per-item dispatch.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary block after dispatch.
fn print_summary(report: &BatchReport, elapsed: std::time::Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        report.len() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", report.succeeded());
    if report.failed() > 0 {
        eprintln!("    Failed:       {:>8}", report.failed());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", report.len());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.2} items/sec", rate);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_prompt_wins() {
        let prompt = select_prompt(Some("Describe it."), Some("3"), "0");
        assert_eq!(prompt, PromptSpec::text("Describe it."));
    }

    #[test]
    fn test_explicit_prompt_id() {
        let prompt = select_prompt(None, Some("7"), "3");
        assert_eq!(prompt, PromptSpec::catalog_id("7"));
    }

    #[test]
    fn test_configured_default_id() {
        let prompt = select_prompt(None, None, "3");
        assert_eq!(prompt, PromptSpec::catalog_id("3"));
    }
}
