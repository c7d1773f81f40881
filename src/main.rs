use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tourcat::config::LoggingConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "tourcat",
    version,
    about = "Tour catalog server with a self-refreshing upstream ingestion pipeline",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the catalog over HTTP, refreshing it in the background
    Serve {
        /// TOML configuration file (defaults to environment variables)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the bind address, e.g. 127.0.0.1:8080
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Run a single ingestion and print a summary
    Fetch {
        /// TOML configuration file (defaults to environment variables)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Self::Serve { config, .. } | Self::Fetch { config } => config.as_deref(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.command.config_path())?;

    // Initialize tracing/logging
    let logging = config
        .logging
        .clone()
        .with_overrides(cli.verbose, cli.log_format.as_deref());
    setup_tracing(&logging)?;

    tracing::info!("tourcat starting");

    match cli.command {
        Commands::Serve { config: path, bind } => {
            tracing::info!(config = ?path, bind = ?bind, "Starting serve command");
            commands::serve(config, bind).await?;
        }

        Commands::Fetch { config: path } => {
            tracing::info!(config = ?path, "Starting fetch command");
            commands::fetch(&config).await?;
        }
    }

    tracing::info!("tourcat completed successfully");
    Ok(())
}

fn setup_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.default_filter()));

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "text" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        other => anyhow::bail!("Unknown log format: {other} (expected text or json)"),
    }

    Ok(())
}
