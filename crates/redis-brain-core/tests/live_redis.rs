//! Live Redis Tests
//!
//! Run with: cargo test -p redis-brain-core --features redis-tests
//! Uses `REDIS_URL` when set, `redis://127.0.0.1:6379` otherwise.

#![cfg(feature = "redis-tests")]

use redis_brain_core::{
    Brain, BrainConfig, BrainPersistence, ConnectionTarget, Connector, RedisBrain, RedisConnector,
    ReconnectPolicy, UrlSource,
};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_url() -> String {
    let base = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}/redis-brain-test-{}", base.trim_end_matches('/'), nanos)
}

#[tokio::test]
async fn test_round_trip_through_redis() {
    let url = unique_url();
    let config = || BrainConfig::from_url(&url, UrlSource::Default, false).unwrap();

    let brain = Brain::new();
    let handle = tokio::spawn(RedisBrain::new(config(), brain.clone()).run());
    brain.wait_connected().await;
    brain.set("users", json!({"1": {"name": "alice"}})).await;
    brain.close().await;
    handle.await.unwrap().unwrap();

    let brain = Brain::new();
    let handle = tokio::spawn(RedisBrain::new(config(), brain.clone()).run());
    brain.wait_connected().await;
    assert_eq!(brain.get("users").await, Some(json!({"1": {"name": "alice"}})));
    brain.close().await;
    handle.await.unwrap().unwrap();

    // Clean up the test key.
    let target = ConnectionTarget::parse(&url).unwrap();
    let storage = RedisConnector::new(ReconnectPolicy::new().with_max_attempts(1))
        .connect(&target)
        .await
        .unwrap();
    let mut persistence = BrainPersistence::new(Brain::new(), storage, &target);
    persistence.save(None).await.unwrap();
    assert_eq!(persistence.fetch().await.unwrap(), Some(json!({})));
    persistence.close().await;
}
