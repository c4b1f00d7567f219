//! Host capabilities
//!
//! The adapter only talks to the bot's brain through [`BrainHost`].

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// Lifecycle events published by the host brain
#[derive(Debug, Clone, PartialEq)]
pub enum BrainEvent {
    /// Persist this snapshot (`None` is stored as `{}`)
    Save(Option<Value>),
    /// The brain is shutting down
    Close,
}

/// What the adapter needs from the host brain
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrainHost: Send + Sync {
    /// Merge a loaded snapshot into the in-memory brain
    async fn merge_data(&self, data: Value);

    /// Enable or disable periodic saves
    async fn set_auto_save(&self, enabled: bool);

    /// Signal that stored state has been loaded
    async fn connected(&self);

    /// Subscribe to save/close events
    fn subscribe(&self) -> broadcast::Receiver<BrainEvent>;
}
