use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use oreilly_feed::config::{Config, OutputTarget, Overrides, TOKEN_ENV_VAR};
use oreilly_feed::pipeline;

/// Get the default config file path (~/.config/oreilly-feed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("oreilly-feed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "oreilly-feed",
    about = "Generate an RSS feed from an O'Reilly Online Learning search"
)]
struct Args {
    /// Config file (defaults to ~/.config/oreilly-feed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Search term
    #[arg(short, long)]
    query: Option<String>,

    /// Maximum number of results to request
    #[arg(short, long)]
    limit: Option<u32>,

    /// Output file, or `-` for stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Content type filter passed to the search API
    #[arg(long = "type", value_name = "TYPE")]
    content_type: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `--output -` keeps stdout clean for the feed
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let query_config = config
        .resolve(Overrides {
            query: args.query,
            limit: args.limit,
            output: args.output,
            content_type: args.content_type,
            api_token: std::env::var(TOKEN_ENV_VAR).ok(),
        })
        .context("Invalid configuration")?;

    let client = pipeline::build_client().context("Failed to build HTTP client")?;

    let summary = pipeline::run(&client, &query_config)
        .await
        .context("Feed generation failed")?;

    match summary.target {
        OutputTarget::Stdout => {
            eprintln!("RSS feed generated ({} items)", summary.item_count);
        }
        OutputTarget::File(ref path) => {
            println!(
                "RSS feed generated: {} ({} items)",
                path.display(),
                summary.item_count
            );
        }
    }

    Ok(())
}
