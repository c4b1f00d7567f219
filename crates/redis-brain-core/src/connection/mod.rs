//! Connection - storage backends for the brain snapshot
//!
//! - [`BrainStorage`]: the four commands the adapter needs (`PING`, `GET`,
//!   `SET`, `QUIT`)
//! - [`Connector`]: opens one storage connection for a target
//! - [`RedisConnector`] / [`RedisStorage`]: production backend
//! - [`MemoryConnector`] / [`MemoryStorage`]: development/testing backend

mod memory;
mod reconnect;
mod redis_storage;

pub use memory::{MemoryConnector, MemoryStorage};
pub use reconnect::ReconnectPolicy;
pub use redis_storage::{client_url, RedisConnector, RedisStorage};

use crate::config::ConnectionTarget;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, error};

/// Storage commands used by the adapter
#[async_trait]
pub trait BrainStorage: Send {
    /// Ready check
    async fn ping(&mut self) -> Result<()>;

    /// Read a string value
    async fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Overwrite a string value
    async fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Close the connection once pending commands have completed
    async fn quit(&mut self) -> Result<()>;
}

/// Opens the single storage connection
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `target`, authenticating when it carries credentials.
    ///
    /// Returns [`Error::Authentication`] when the server rejects the password.
    /// Every other error is already logged via [`report_connection_error`].
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn BrainStorage>>;
}

/// How a connection-level error is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorDisposition {
    /// Expected while Redis is still starting; logged at debug level only
    Suppressed,
    /// Logged as an error
    Reported,
}

impl ConnectionErrorDisposition {
    /// Classify an error
    #[must_use]
    pub fn of(error: &Error) -> Self {
        if error.is_connection_refused() {
            Self::Suppressed
        } else {
            Self::Reported
        }
    }
}

/// Log a connection-level error according to its disposition.
pub fn report_connection_error(error: &Error) -> ConnectionErrorDisposition {
    let disposition = ConnectionErrorDisposition::of(error);
    match disposition {
        ConnectionErrorDisposition::Suppressed => {
            debug!(error = %error, "Redis connection refused");
        }
        ConnectionErrorDisposition::Reported => {
            error!(error = %error, "Redis connection error");
        }
    }
    disposition
}
