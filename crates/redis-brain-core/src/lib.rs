//! Redis Brain Core - brain persistence for chat bots
//!
//! This crate stores a bot's in-memory brain as one JSON document in Redis,
//! including:
//! - Config: resolving the Redis target from the environment
//! - Connection: the single storage connection, with reconnect and auth
//! - Adapter: load on connect, save on every host save event, quit on close
//! - Brain: an in-memory host with a periodic auto-save loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod brain;
pub mod config;
pub mod connection;
pub mod error;
pub mod host;

pub use adapter::{BrainPersistence, RedisBrain};
pub use brain::{Brain, DEFAULT_SAVE_INTERVAL};
pub use config::{mask_url, BrainConfig, ConnectionTarget, EnvSource, ProcessEnv, UrlSource};
pub use connection::{
    BrainStorage, ConnectionErrorDisposition, Connector, MemoryConnector, MemoryStorage,
    ReconnectPolicy, RedisConnector, RedisStorage,
};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use host::{BrainEvent, BrainHost};
