//! `redis-brain dump`

use super::report;
use crate::settings::load_settings;
use anyhow::Result;
use redis_brain_core::{
    Brain, BrainConfig, BrainPersistence, Connector, ProcessEnv, RedisConnector,
};

/// Attempts before giving up when the settings retry forever
const DUMP_CONNECT_ATTEMPTS: u32 = 3;

/// Print the stored brain as pretty JSON
pub async fn run() -> Result<()> {
    let settings = load_settings()?;
    let config = BrainConfig::from_env(&ProcessEnv).map_err(report)?;

    let mut policy = settings.reconnect.policy();
    if policy.max_attempts.is_none() {
        policy = policy.with_max_attempts(DUMP_CONNECT_ATTEMPTS);
    }

    let storage = RedisConnector::new(policy)
        .connect(&config.target)
        .await
        .map_err(report)?;
    let mut persistence = BrainPersistence::new(Brain::new(), storage, &config.target);

    if !config.skip_ready_check() {
        persistence.ready_check().await.map_err(report)?;
    }
    let data = persistence.fetch().await;
    persistence.close().await;

    match data.map_err(report)? {
        Some(data) => println!("{}", serde_json::to_string_pretty(&data)?),
        None => eprintln!("No brain stored under '{}'", persistence.storage_key()),
    }
    Ok(())
}
