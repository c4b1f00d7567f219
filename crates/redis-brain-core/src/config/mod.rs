//! Configuration - Redis target resolution
//!
//! This module turns the process environment into a [`BrainConfig`]:
//! - Generic URL variables (`REDISTOGO_URL`, `REDISCLOUD_URL`,
//!   `BOXEN_REDIS_URL`, `REDIS_URL`), first match wins
//! - Cloud Foundry service binding (`REDIS_SERVICE_INSTANCE`)
//! - `redis://localhost:6379` otherwise

mod env;
mod resolver;
mod service_binding;
mod target;

pub use env::{
    EnvSource, ProcessEnv, NO_READY_CHECK_VAR, SERVICES_DESCRIPTOR_VAR, SERVICE_INSTANCE_VAR,
    SERVICE_NAME_VAR, URL_VARS,
};
pub use resolver::{resolve_url, BrainConfig, UrlSource, DEFAULT_URL};
pub use service_binding::{service_binding_url, ServiceDescriptor};
pub use target::{mask_url, ConnectionTarget, TargetAddr, DEFAULT_PORT, DEFAULT_PREFIX};

#[cfg(test)]
mod tests;
