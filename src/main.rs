use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use bionews::config::Config;
use bionews::pipeline::{Pipeline, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "bionews",
    version,
    about = "Publish a daily biotech/pharma headline digest to GitHub"
)]
struct Args {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, value_name = "FILE", default_value = "bionews.toml")]
    config: PathBuf,

    /// Render the digest without publishing or updating the seen set
    #[arg(long)]
    dry_run: bool,

    /// Write the rendered digest here instead of the configured path
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    config.apply_env();
    if let Some(output) = args.output {
        config.output_path = output;
    }
    tracing::debug!(config = ?config, "Effective configuration");

    let pipeline = Pipeline::from_config(config)?;
    let summary = pipeline
        .run(RunOptions {
            dry_run: args.dry_run,
            ..RunOptions::default()
        })
        .await?;

    tracing::info!(
        collected = summary.collected,
        failed_feeds = summary.failed_feeds,
        items = summary.items.len(),
        newly_seen = summary.newly_seen,
        "Run complete"
    );
    match &summary.publication {
        Some(publication) => println!("Published digest: {}", publication.url),
        None => println!(
            "Digest written to {} (not published)",
            pipeline.config().output_path.display()
        ),
    }

    Ok(())
}
