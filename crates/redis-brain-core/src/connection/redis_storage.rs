use super::{report_connection_error, BrainStorage, Connector, ReconnectPolicy};
use crate::config::{ConnectionTarget, TargetAddr};
use crate::error::{Error, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use secrecy::ExposeSecret;
use tracing::{debug, info};
use url::Url;

/// Redis-backed brain storage (for production)
///
/// Wraps a [`ConnectionManager`], which re-establishes the connection (and
/// re-authenticates) on its own after the first successful connect.
pub struct RedisStorage {
    conn: ConnectionManager,
}

impl RedisStorage {
    /// Open a connection to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the server rejects the password and
    /// [`Error::Redis`] for any other connection failure.
    pub async fn open(target: &ConnectionTarget) -> Result<Self> {
        let client = redis::Client::open(client_url(target)?.as_str())?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            if e.kind() == redis::ErrorKind::AuthenticationFailed {
                Error::Authentication(e.to_string())
            } else {
                Error::Redis(e)
            }
        })?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl BrainStorage for RedisStorage {
    async fn ping(&mut self) -> Result<()> {
        let reply: String = redis::cmd("PING").query_async(&mut self.conn).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(Error::ReadyCheck(format!("unexpected PING reply '{}'", reply)))
        }
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut self.conn).await?;
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        redis::cmd("QUIT").query_async::<()>(&mut self.conn).await?;
        Ok(())
    }
}

/// Connects with [`RedisStorage`], retrying the first connection according
/// to a [`ReconnectPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RedisConnector {
    policy: ReconnectPolicy,
}

impl RedisConnector {
    /// Create a connector with the given initial-connect policy
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn BrainStorage>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match RedisStorage::open(target).await {
                Ok(storage) => {
                    if target.password().is_some() {
                        info!(addr = %target.addr(), "Successfully authenticated to Redis");
                    } else {
                        debug!(addr = %target.addr(), attempt, "Successfully connected to Redis");
                    }
                    return Ok(Box::new(storage));
                }
                Err(e) if is_transient(&e) => {
                    report_connection_error(&e);
                    if !self.policy.allows_retry_after(attempt) {
                        return Err(e);
                    }
                    let delay = self.policy.delay_after(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying Redis connection"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e @ Error::Authentication(_)) => return Err(e),
                Err(e) => {
                    report_connection_error(&e);
                    return Err(e);
                }
            }
        }
    }
}

fn is_transient(error: &Error) -> bool {
    matches!(error, Error::Redis(e) if e.is_io_error() || e.is_connection_refusal())
}

/// URL handed to `redis::Client`.
///
/// The prefix never reaches the client: it is a key namespace, not a
/// database index.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the target cannot be expressed as a URL.
pub fn client_url(target: &ConnectionTarget) -> Result<String> {
    let invalid = |message: String| Error::InvalidUrl {
        url: target.addr().to_string(),
        message,
    };

    let mut url = match target.addr() {
        TargetAddr::Tcp { host, port } => Url::parse(&format!("redis://{}:{}", host, port))
            .map_err(|e| invalid(e.to_string()))?,
        TargetAddr::Unix { path } => {
            let mut url = Url::parse("unix:///").map_err(|e| invalid(e.to_string()))?;
            url.set_path(&path.to_string_lossy());
            url
        }
    };

    if let Some(password) = target.password() {
        match target.addr() {
            TargetAddr::Tcp { .. } => url
                .set_password(Some(password.expose_secret()))
                .map_err(|_| invalid("password cannot be set".to_string()))?,
            TargetAddr::Unix { .. } => {
                url.query_pairs_mut()
                    .append_pair("pass", password.expose_secret());
            }
        }
    }

    Ok(url.to_string())
}
