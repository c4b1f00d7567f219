//! In-memory host brain
//!
//! A key-value store of JSON values with a periodic auto-save loop, usable as
//! the [`BrainHost`] for the adapter when no other host embeds it.
//!
//! ## Usage
//!
//! ```ignore
//! let brain = Brain::new();
//! brain.reset_save_interval(DEFAULT_SAVE_INTERVAL);
//!
//! let adapter = RedisBrain::new(config, brain.clone());
//! let handle = tokio::spawn(adapter.run());
//!
//! brain.set("greeting", json!("hello")).await;
//! brain.close().await;
//! handle.await??;
//! ```

use crate::host::{BrainEvent, BrainHost};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// Default period of the auto-save loop
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Buffered events before slow subscribers start lagging
const EVENT_CAPACITY: usize = 256;

/// In-memory brain
pub struct Brain {
    data: RwLock<Map<String, Value>>,
    auto_save: AtomicBool,
    events: broadcast::Sender<BrainEvent>,
    connected: watch::Sender<bool>,
    save_task: Mutex<Option<JoinHandle<()>>>,
}

impl Brain {
    /// Create an empty brain with auto-save enabled and no save loop running
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (connected, _) = watch::channel(false);
        Arc::new(Self {
            data: RwLock::new(Map::new()),
            auto_save: AtomicBool::new(true),
            events,
            connected,
            save_task: Mutex::new(None),
        })
    }

    /// Value stored under `key`
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.data.read().await.get(key).cloned()
    }

    /// Store `value` under `key`
    pub async fn set(&self, key: impl Into<String>, value: Value) {
        self.data.write().await.insert(key.into(), value);
    }

    /// Remove `key`, returning its value
    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.write().await.remove(key)
    }

    /// All keys
    pub async fn keys(&self) -> Vec<String> {
        self.data.read().await.keys().cloned().collect()
    }

    /// Copy of the whole brain as a JSON object
    pub async fn snapshot(&self) -> Value {
        Value::Object(self.data.read().await.clone())
    }

    /// Whether the auto-save loop currently publishes saves
    #[must_use]
    pub fn auto_save(&self) -> bool {
        self.auto_save.load(Ordering::SeqCst)
    }

    /// Whether stored state has been loaded
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Wait until stored state has been loaded
    pub async fn wait_connected(&self) {
        let mut rx = self.connected.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|connected| *connected).await;
    }

    /// Number of live event subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Publish the current snapshot as a save event.
    ///
    /// Returns the number of subscribers that received it.
    pub async fn save(&self) -> usize {
        let snapshot = self.snapshot().await;
        self.publish(BrainEvent::Save(Some(snapshot)))
    }

    /// (Re)start the auto-save loop with a new period.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn reset_save_interval(self: &Arc<Self>, period: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(brain) = weak.upgrade() else {
                    break;
                };
                if brain.auto_save() {
                    brain.save().await;
                }
            }
        });

        if let Some(previous) = self.lock_save_task().replace(handle) {
            previous.abort();
        }
        debug!(period_secs = period.as_secs_f64(), "Auto-save interval reset");
    }

    /// Stop the auto-save loop, publish a final save, then publish close.
    pub async fn close(&self) {
        if let Some(task) = self.lock_save_task().take() {
            task.abort();
        }
        self.save().await;
        self.publish(BrainEvent::Close);
        info!("Brain closed");
    }

    fn publish(&self, event: BrainEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    fn lock_save_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.save_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for Brain {
    fn drop(&mut self) {
        if let Some(task) = self.lock_save_task().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl BrainHost for Brain {
    async fn merge_data(&self, data: Value) {
        match data {
            Value::Object(incoming) => {
                let mut data = self.data.write().await;
                let count = incoming.len();
                for (key, value) in incoming {
                    data.insert(key, value);
                }
                debug!(keys = count, "Merged data into brain");
            }
            other => {
                warn!(kind = %json_kind(&other), "Ignoring non-object brain data");
            }
        }
    }

    async fn set_auto_save(&self, enabled: bool) {
        self.auto_save.store(enabled, Ordering::SeqCst);
        debug!(enabled, "Auto-save toggled");
    }

    async fn connected(&self) {
        self.connected.send_replace(true);
        debug!("Brain connected to storage");
    }

    fn subscribe(&self) -> broadcast::Receiver<BrainEvent> {
        self.events.subscribe()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
