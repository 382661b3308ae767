//! ipwarm - IP warm-up operator entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use ipwarm_common::config::Config;
use ipwarm_core::{
    HttpIpProvisioner, HttpMailTransport, ProviderClient, WarmupEngine, WarmupPhase,
    WarmupSettings,
};
use ipwarm_storage::{create_repository, WarmupStatus};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ipwarm")]
#[command(about = "Warm up dedicated sending IP addresses", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $IPWARM_CONFIG, then the standard search paths)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Allocate new dedicated IP addresses and start warming them up
    Provision {
        /// Number of IP addresses to allocate
        count: u32,

        /// Subusers the addresses are assigned to
        subusers: Vec<String>,
    },
    /// Warm up IP addresses the account already owns
    Adopt {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Show the warm-up progress of the configured pool
    Status,
}

#[derive(Serialize)]
struct Report<'a> {
    phase: WarmupPhase,
    status: &'a WarmupStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    ipwarm_common::logging::init(&config.logging)?;

    // Initialize the warm-up status store
    let repository = create_repository(&config.store).await?;
    info!(backend = %config.store.backend, "Warm-up status store ready");

    // Wire the provider collaborators
    let client = ProviderClient::new(&config.provider)?;
    let engine = WarmupEngine::new(
        WarmupSettings::from_config(&config.warmup)?,
        repository,
        Arc::new(HttpIpProvisioner::new(client.clone())),
        Arc::new(HttpMailTransport::new(client)),
    );

    // Cancel in-flight work on shutdown signal
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Shutdown signal received");
                cancel.cancel();
            }
        });
    }

    let status = match cli.command {
        Commands::Provision { count, subusers } => {
            engine
                .prepare_with_new_ip_addresses(count, &subusers, &cancel)
                .await?
        }
        Commands::Adopt { addresses } => {
            engine
                .prepare_with_existing_ip_addresses(&addresses, &cancel)
                .await?
        }
        Commands::Status => engine.status(&cancel).await?,
    };

    let report = Report {
        phase: engine.phase(&status),
        status: &status,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
