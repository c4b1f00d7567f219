//! Brain persistence adapter
//!
//! [`RedisBrain`] owns the single Redis connection for the process lifetime:
//!
//! 1. disable auto-save on the host
//! 2. connect (authenticating when the URL carries a password)
//! 3. `PING` unless the ready check is skipped
//! 4. load `{prefix}:storage` into the host, signal connected, enable auto-save
//! 5. write every save event back, `QUIT` on close
//!
//! Events are handled one at a time, so saves reach Redis in the order the
//! host issued them.

use crate::config::{BrainConfig, ConnectionTarget};
use crate::connection::{BrainStorage, ConnectionErrorDisposition, Connector, RedisConnector};
use crate::error::{Error, Result};
use crate::host::{BrainEvent, BrainHost};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, error, info, warn};

/// Load and save operations over one storage connection
pub struct BrainPersistence {
    host: Arc<dyn BrainHost>,
    storage: Box<dyn BrainStorage>,
    prefix: String,
    key: String,
}

impl BrainPersistence {
    /// Bind `storage` to the storage key of `target`
    #[must_use]
    pub fn new(
        host: Arc<dyn BrainHost>,
        storage: Box<dyn BrainStorage>,
        target: &ConnectionTarget,
    ) -> Self {
        Self {
            host,
            storage,
            prefix: target.prefix().to_string(),
            key: target.storage_key(),
        }
    }

    /// The Redis key the brain is stored under
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// `PING` the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadyCheck`] if the server does not answer.
    pub async fn ready_check(&mut self) -> Result<()> {
        self.storage.ping().await.map_err(|e| match e {
            Error::ReadyCheck(_) => e,
            other => Error::ReadyCheck(other.to_string()),
        })?;
        debug!("Redis ready check passed");
        Ok(())
    }

    /// Read and parse the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored value is not JSON.
    pub async fn fetch(&mut self) -> Result<Option<Value>> {
        match self.storage.get(&self.key).await? {
            Some(json) if !json.is_empty() => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }

    /// Load the stored snapshot into the host.
    ///
    /// Merges `{}` on first run. On success the host is signalled connected
    /// and auto-save is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored value is not JSON.
    pub async fn load(&mut self) -> Result<()> {
        self.merge_stored().await?;
        self.mark_loaded().await;
        Ok(())
    }

    /// Merge the stored snapshot (or `{}` on first run) into the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored value is not JSON.
    pub async fn merge_stored(&mut self) -> Result<()> {
        let data = match self.fetch().await? {
            Some(data) => {
                info!(prefix = %self.prefix, "Brain data retrieved from Redis");
                data
            }
            None => {
                info!(prefix = %self.prefix, "Initializing new brain data");
                Value::Object(Map::new())
            }
        };

        self.host.merge_data(data).await;
        Ok(())
    }

    /// Signal the host connected and enable auto-save
    pub async fn mark_loaded(&mut self) {
        self.host.connected().await;
        self.host.set_auto_save(true).await;
    }

    /// Overwrite the stored snapshot (`None` is stored as `{}`).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&mut self, data: Option<Value>) -> Result<()> {
        let data = data.unwrap_or_else(|| Value::Object(Map::new()));
        let json = serde_json::to_string(&data)?;
        self.storage.set(&self.key, &json).await?;

        debug!(key = %self.key, bytes = json.len(), "Brain saved to Redis");
        Ok(())
    }

    /// Send `QUIT`. Failures are logged.
    pub async fn close(&mut self) {
        match self.storage.quit().await {
            Ok(()) => info!(prefix = %self.prefix, "Redis connection closed"),
            Err(e) => warn!(error = %e, "Failed to close Redis connection cleanly"),
        }
    }
}

/// Persists a host brain into Redis
pub struct RedisBrain {
    config: BrainConfig,
    host: Arc<dyn BrainHost>,
    connector: Arc<dyn Connector>,
}

impl RedisBrain {
    /// Adapter using the production [`RedisConnector`]
    #[must_use]
    pub fn new(config: BrainConfig, host: Arc<dyn BrainHost>) -> Self {
        Self::with_connector(config, host, Arc::new(RedisConnector::default()))
    }

    /// Adapter using a custom connector
    #[must_use]
    pub fn with_connector(
        config: BrainConfig,
        host: Arc<dyn BrainHost>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            host,
            connector,
        }
    }

    /// Run until the host closes.
    ///
    /// An authentication failure is logged and leaves the brain unloaded until
    /// close; the future still resolves to `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established (after the
    /// connector's retries), the ready check fails, or the initial load fails.
    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            host,
            connector,
        } = self;
        let target = &config.target;

        host.set_auto_save(false).await;
        let mut events = host.subscribe();

        info!(url = %config.display_url, source = %config.source, "Connecting to Redis");
        let Some(connected) = drive(connector.connect(target), &mut events, "connect").await else {
            info!("Brain closed before Redis connection was established");
            return Ok(());
        };

        let storage = match connected {
            Ok(storage) => storage,
            Err(Error::Authentication(reason)) => {
                error!(reason = %reason, "Failed to authenticate to Redis");
                let _ = drive(std::future::pending::<()>(), &mut events, "unauthenticated").await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut persistence = BrainPersistence::new(host, storage, target);

        if config.skip_ready_check() {
            debug!("Redis ready check skipped");
        } else {
            let Some(ready) = drive(persistence.ready_check(), &mut events, "ready check").await
            else {
                persistence.close().await;
                return Ok(());
            };
            ready?;
        }

        let Some(loaded) = drive(persistence.merge_stored(), &mut events, "load").await else {
            persistence.close().await;
            return Ok(());
        };
        loaded?;

        if !discard_queued(&mut events) {
            persistence.close().await;
            return Ok(());
        }
        persistence.mark_loaded().await;

        loop {
            match events.recv().await {
                Ok(BrainEvent::Save(data)) => {
                    if let Err(e) = persistence.save(data).await {
                        report_save_error(persistence.storage_key(), &e);
                    }
                }
                Ok(BrainEvent::Close) | Err(RecvError::Closed) => {
                    persistence.close().await;
                    return Ok(());
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Brain events lagged; later saves still apply");
                }
            }
        }
    }
}

/// Log a failed save. A refused connection only means Redis is down and is
/// kept out of the error log.
fn report_save_error(key: &str, error: &Error) {
    match ConnectionErrorDisposition::of(error) {
        ConnectionErrorDisposition::Suppressed => {
            debug!(key = %key, error = %error, "Redis refused the connection; save skipped");
        }
        ConnectionErrorDisposition::Reported => {
            error!(key = %key, error = %error, "Failed to save brain to Redis");
        }
    }
}

/// Drive `fut` while draining host events.
///
/// Saves are not written while the brain is not loaded. Returns `None` if the
/// host closes first.
async fn drive<F: Future>(
    fut: F,
    events: &mut broadcast::Receiver<BrainEvent>,
    phase: &'static str,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            output = &mut fut => return Some(output),
            event = events.recv() => match event {
                Ok(BrainEvent::Save(_)) => {
                    warn!(phase, "Brain not loaded from Redis; save skipped");
                }
                Ok(BrainEvent::Close) | Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(phase, skipped, "Brain events lagged");
                }
            },
        }
    }
}

/// Drop saves queued while the load was in flight; they carry pre-load
/// snapshots. Returns `false` if a close was queued.
///
/// Runs before the host is signalled connected, so every save issued after
/// that signal is written.
fn discard_queued(events: &mut broadcast::Receiver<BrainEvent>) -> bool {
    loop {
        match events.try_recv() {
            Ok(BrainEvent::Save(_)) => {
                warn!("Discarding save queued before the brain was loaded");
            }
            Ok(BrainEvent::Close) | Err(TryRecvError::Closed) => return false,
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty) => return true,
        }
    }
}
