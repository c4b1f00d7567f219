//! `redis-brain run`

use super::report;
use crate::settings::load_settings;
use anyhow::{bail, Context, Result};
use redis_brain_core::{Brain, BrainConfig, ProcessEnv, RedisBrain, RedisConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{info, warn};

/// Run the brain until Ctrl+C or SIGTERM, then save and close
pub async fn run(save_interval: Option<u64>) -> Result<()> {
    let settings = load_settings()?;
    let interval_secs = save_interval.unwrap_or(settings.save_interval_secs);
    if interval_secs == 0 {
        bail!("--save-interval must be greater than 0");
    }

    let config = BrainConfig::from_env(&ProcessEnv).map_err(report)?;
    info!(
        "Starting redis-brain v{} ({} from {})",
        env!("CARGO_PKG_VERSION"),
        config.display_url,
        config.source
    );

    let brain = Brain::new();
    brain.reset_save_interval(Duration::from_secs(interval_secs));

    let connector = Arc::new(RedisConnector::new(settings.reconnect.policy()));
    let mut adapter =
        tokio::spawn(RedisBrain::with_connector(config, brain.clone(), connector).run());

    tokio::select! {
        _ = wait_for_shutdown_signal() => {}
        result = &mut adapter => {
            // Only a failed connect or load ends the adapter before close.
            return finish(result);
        }
    }

    info!("Shutting down");
    brain.close().await;
    finish(adapter.await)
}

fn finish(result: std::result::Result<redis_brain_core::Result<()>, JoinError>) -> Result<()> {
    result
        .context("Brain adapter task failed")?
        .map_err(report)
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
