//! Custody Gateway (v1)
//!
//! A custodial stablecoin payment backend built with Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                 CUSTODY GATEWAY                  │
//!                    │                                                  │
//!   UI/API layer     │  ┌──────────┐    ┌──────────┐    ┌────────────┐ │
//!   ─────────────────┼─▶│ schedule │───▶│ signing  │───▶│   vault    │ │
//!   (external)       │  │ manager  │    │ protocol │    │ (read)     │ │
//!                    │  └────┬─────┘    └────┬─────┘    └────────────┘ │
//!                    │       │               │                          │
//!                    │       ▼               ▼                          │
//!                    │  ┌──────────────────────────┐                    │
//!                    │  │   provider clients       │──▶ custody provider│──▶ blockchain
//!                    │  │ privileged │ signing-only│    (external)      │
//!                    │  └──────────────────────────┘                    │
//!                    │                                                  │
//!                    │  ┌────────────────────────────────────────────┐  │
//!                    │  │           Cross-Cutting Concerns           │  │
//!                    │  │  config │ resilience │ notify │ lifecycle  │  │
//!                    │  └────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! The binary owns the one background task: the periodic reconciliation
//! loop, which refreshes local schedule state from the provider's view.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use custody_gateway::config::{load_config, GatewayConfig};
use custody_gateway::lifecycle::Shutdown;
use custody_gateway::notify::Notifier;
use custody_gateway::provider::{HttpPrivilegedClient, HttpSigningClient};
use custody_gateway::resilience::RetryPolicy;
use custody_gateway::schedule::{ScheduleManager, ScheduleStore};
use custody_gateway::signing::TransferSigner;
use custody_gateway::vault::{CredentialStore, Vault, VaultCipher};

#[derive(Parser)]
#[command(name = "custody-gateway")]
#[command(about = "Custodial stablecoin payment gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custody_gateway=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("custody-gateway v0.1.0 starting");

    let args = Args::parse();
    let config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "Config file not found, using defaults");
        GatewayConfig::default()
    };

    tracing::info!(
        provider_url = %config.provider.base_url,
        asset = %config.scheduling.asset,
        reconcile_interval_secs = config.reconciliation.interval_secs,
        "Configuration loaded"
    );

    // Secrets come from the environment, never from the config file.
    let cipher = VaultCipher::from_env(&config.vault.key_env)?;
    let api_key = std::env::var(&config.provider.api_key_env).map_err(|_| {
        format!(
            "environment variable {} not set",
            config.provider.api_key_env
        )
    })?;

    let privileged = Arc::new(HttpPrivilegedClient::new(&config.provider, api_key)?);
    let signing_client = Arc::new(HttpSigningClient::new(&config.provider)?);
    let retry = RetryPolicy::new(
        config.provider.submit_max_attempts,
        config.provider.submit_backoff_base_ms,
        config.provider.submit_backoff_max_ms,
    );
    let signer = Arc::new(TransferSigner::new(
        privileged.clone(),
        signing_client,
        retry,
    ));

    let credential_store = match &config.vault.credential_store_path {
        Some(path) => CredentialStore::load_from_file(path)?,
        None => CredentialStore::new(None),
    };
    let vault = Arc::new(Vault::new(cipher, credential_store));

    let schedule_store = match &config.scheduling.store_path {
        Some(path) => ScheduleStore::load_from_file(path)?,
        None => ScheduleStore::new(None),
    };
    let notifier = Notifier::new(&config.notifications);

    let manager = Arc::new(ScheduleManager::new(
        privileged,
        signer,
        vault,
        schedule_store.clone(),
        notifier,
        config.scheduling.clone(),
        config.reconciliation.max_concurrent_fetches,
    ));

    // Periodic reconciliation loop, the only background task.
    let shutdown = Shutdown::new();
    let mut shutdown_rx = shutdown.subscribe();
    let interval_secs = config.reconciliation.interval_secs;
    let reconcile_manager = manager.clone();
    let reconcile_loop = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = reconcile_manager.reconcile_now().await;
                    if summary.failed > 0 {
                        tracing::warn!(failed = summary.failed, "Reconciliation pass had failures");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Reconciliation loop stopping");
                    break;
                }
            }
        }
    });

    tracing::info!("Gateway running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    shutdown.trigger();
    let _ = reconcile_loop.await;

    if let Err(e) = schedule_store.save_to_file() {
        tracing::warn!(error = %e, "Failed to snapshot schedule store on shutdown");
    }

    tracing::info!("custody-gateway stopped");
    Ok(())
}
