//! Error types for redis-brain-core
//!
//! This module provides error types and user-friendly error formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// The resolved Redis URL could not be parsed
    #[error("invalid redis url '{url}': {message}")]
    InvalidUrl {
        /// URL with any password masked
        url: String,
        /// Detailed message
        message: String,
    },

    /// Platform service binding could not be resolved
    #[error("service binding error: {0}")]
    ServiceBinding(String),

    /// Redis rejected the supplied password
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Server did not answer the ready check
    #[error("ready check failed: {0}")]
    ReadyCheck(String),

    /// Redis transport or protocol error
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Snapshot (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a refused TCP/socket connection.
    #[must_use]
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Error::Redis(e) if e.is_connection_refusal())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
///
/// Provides human-readable error messages and suggestions for fixing.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidUrl { url, message } => {
                format!("🔗 Redis URL '{}' is not usable: {}", url, message)
            }
            Error::ServiceBinding(msg) => {
                format!("☁️ Could not read the Redis service binding: {}", msg)
            }
            Error::Authentication(_) => "🔑 Redis rejected the configured password.".to_string(),
            Error::ReadyCheck(msg) => format!("⏳ Redis is not ready: {}", msg),
            Error::Redis(e) if e.is_connection_refusal() => {
                "🌐 Redis refused the connection.".to_string()
            }
            Error::Redis(e) => format!("🌐 Redis error: {}", e),
            Error::Serialization(e) => format!("🧠 Stored brain data is not valid JSON: {}", e),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidUrl { .. } => Some(
                "💡 Use redis://host:port/prefix or redis:///path/to/redis.sock?prefix in REDIS_URL."
                    .to_string(),
            ),
            Error::ServiceBinding(_) => Some(
                "💡 Check REDIS_SERVICE_NAME, REDIS_SERVICE_INSTANCE and VCAP_SERVICES.".to_string(),
            ),
            Error::Authentication(_) => {
                Some("💡 Check the password part of the Redis URL.".to_string())
            }
            Error::ReadyCheck(_) => Some(
                "💡 Set REDIS_NO_CHECK=1 if a proxy in front of Redis does not support PING."
                    .to_string(),
            ),
            Error::Redis(e) if e.is_connection_refusal() => {
                Some("💡 Start Redis or point REDIS_URL at a running server.".to_string())
            }
            Error::Serialization(_) => Some(
                "💡 Inspect the {prefix}:storage key; it must hold a JSON document.".to_string(),
            ),
            Error::Redis(_) => None,
        }
    }
}

/// Format an error for display in CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    output.push('\n');

    if let Some(suggestion) = error.suggestion() {
        output.push('\n');
        output.push_str(&suggestion);
        output.push('\n');
    }

    output
}
