use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server::{state::AppState, ServiceConfig};
use shipyard_core::ResourceScope;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_FILE: &str = "shipyard.toml";
/// Used when `RUST_LOG` is unset. Lists every workspace crate that logs.
const DEFAULT_LOG_FILTER: &str =
    "shipyard=info,shipyard_core=info,server=info,orchestrator=info,websocket=info,events=info,tower_http=info";

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Test-then-promote deployment service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept deployment requests over WebSocket
    Serve {
        /// Overrides `server.bind` from the config file
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the scope and endpoint a request would deploy to
    Scope {
        requester: String,
        source_location: String,
        source_revision: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { bind }) => serve(&cli.config, bind).await,
        Some(Commands::Scope {
            requester,
            source_location,
            source_revision,
        }) => scope(&cli.config, &requester, &source_location, &source_revision).await,
        Some(Commands::Config) => print_config(&cli.config).await,
        None => serve(&cli.config, None).await,
    }
}

async fn load_config(path: &Path) -> Result<ServiceConfig> {
    ServiceConfig::read(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

async fn serve(config_path: &Path, bind: Option<String>) -> Result<()> {
    init_tracing();

    let mut config = load_config(config_path).await?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    tracing::info!(config = %config_path.display(), "Configuration loaded");
    tracing::info!(
        poll_interval_secs = config.pipeline.poll_interval_secs,
        ready_timeout_secs = config.pipeline.ready_timeout_secs,
        cleanup_delay_secs = config.pipeline.cleanup_delay_secs,
        "Pipeline timing"
    );

    let state = AppState::from_config(&config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    tracing::info!(addr = %config.server.bind, "Shipyard listening on /ws");

    server::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shut down");
    Ok(())
}

async fn scope(config_path: &Path, requester: &str, location: &str, revision: &str) -> Result<()> {
    let config = load_config(config_path).await?;
    let scope = ResourceScope::generate(requester, location, revision);

    println!("Scope:    {}", scope);
    println!("Endpoint: {}", scope.endpoint(&config.endpoint));

    Ok(())
}

async fn print_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    print!("{}", config.to_toml()?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();
}
