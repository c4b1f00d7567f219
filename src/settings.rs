//! Application settings
//!
//! Loaded from embedded defaults, `config/local.toml`, and `REDIS_BRAIN_*`
//! environment variables, in increasing priority.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use redis_brain_core::ReconnectPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Embedded default settings (compiled into binary)
pub const DEFAULT_SETTINGS: &str = include_str!("../config/default.toml");

/// Binary settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Seconds between auto-saves
    pub save_interval_secs: u64,
    /// Initial connection backoff
    pub reconnect: ReconnectSettings,
}

/// Initial connection backoff settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectSettings {
    /// Delay after the first failed attempt
    pub initial_delay_ms: u64,
    /// Upper bound for the delay
    pub max_delay_ms: u64,
    /// 0 retries forever
    pub max_attempts: u32,
}

impl ReconnectSettings {
    pub fn policy(&self) -> ReconnectPolicy {
        let policy = ReconnectPolicy::new()
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms));
        match self.max_attempts {
            0 => policy,
            attempts => policy.with_max_attempts(attempts),
        }
    }
}

/// Load settings from files and environment
pub fn load_settings() -> Result<AppSettings> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
        .add_source(File::with_name("config/local").required(false))
        // prefix_separator("_") so REDIS_BRAIN_RECONNECT__MAX_ATTEMPTS maps to reconnect.max_attempts
        .add_source(
            Environment::with_prefix("REDIS_BRAIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build settings")?;

    parse_settings(config)
}

fn parse_settings(config: Config) -> Result<AppSettings> {
    let settings: AppSettings = config
        .try_deserialize()
        .context("Failed to deserialize settings")?;

    if settings.save_interval_secs == 0 {
        bail!("save_interval_secs must be greater than 0");
    }
    if settings.reconnect.max_delay_ms < settings.reconnect.initial_delay_ms {
        bail!("reconnect.max_delay_ms must not be below reconnect.initial_delay_ms");
    }

    Ok(settings)
}
