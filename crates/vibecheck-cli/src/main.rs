//! 🚀 vibecheck-cli — the front door, the bouncer, the maitre d' of vibecheck.
//!
//! 📦 Thin wrapper: sets up logging, loads config, and then either serves HTTP
//! or runs one analysis and prints it. The library does the heavy lifting. 🦆

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vibecheck", version, about = "Comment-section sentiment, one video at a time")]
struct Cli {
    /// TOML config file. Skipped (env vars only) if it doesn't exist.
    #[arg(short, long, default_value = "vibecheck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Analyse a single video and print the JSON result.
    Analyze {
        /// The video ID, e.g. dQw4w9WgXcQ
        video_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 📡 RUST_LOG=info is a good place to start. RUST_LOG=debug if it's 3am.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 🔒 A missing file means "env vars only", not "give up"
    let config_file = cli
        .config
        .try_exists()
        .with_context(|| {
            format!(
                "💀 Couldn't check whether the config file exists. Was checking here: '{}'",
                cli.config.display()
            )
        })?
        .then_some(cli.config.as_path());

    let app_config = vibecheck::app_config::load_config(config_file)
        .context("💀 In vibecheck-cli, main, we couldn't load the config. Double check the file and the VIBECHECK_* env vars.")?;

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => vibecheck::serve(app_config).await,
        Command::Analyze { video_id } => analyze(&app_config, &video_id).await,
    };

    if let Err(err) = result {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn analyze(app_config: &vibecheck::app_config::AppConfig, video_id: &str) -> Result<()> {
    let started = Instant::now();
    let outcome = vibecheck::analyze_once(app_config, video_id).await?;
    let elapsed = started.elapsed().as_secs_f64();

    match outcome {
        Ok(result) => {
            let pretty = serde_json::to_string_pretty(&result)
                .context("💀 Couldn't render the analysis as JSON")?;
            println!("{pretty}");
            eprintln!("{elapsed:.2} seconds");
            Ok(())
        }
        Err(kind) => anyhow::bail!(
            "💀 Analysis of '{}' failed after {:.2}s with status {}: {}",
            video_id,
            elapsed,
            kind.status_code(),
            kind.client_message()
        ),
    }
}
