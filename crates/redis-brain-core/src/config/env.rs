//! Environment sources
//!
//! The resolver only reads the environment through [`EnvSource`], so the rest
//! of the crate never touches `std::env` directly.

use std::collections::HashMap;

/// Generic Redis URL variables, highest priority first.
pub const URL_VARS: [&str; 4] = ["REDISTOGO_URL", "REDISCLOUD_URL", "BOXEN_REDIS_URL", "REDIS_URL"];

/// Presence disables the `PING` ready check.
pub const NO_READY_CHECK_VAR: &str = "REDIS_NO_CHECK";

/// Label of the service inside the platform descriptor.
pub const SERVICE_NAME_VAR: &str = "REDIS_SERVICE_NAME";

/// Name of the bound service instance. Selects the service-binding path.
pub const SERVICE_INSTANCE_VAR: &str = "REDIS_SERVICE_INSTANCE";

/// Platform service descriptor (Cloud Foundry).
pub const SERVICES_DESCRIPTOR_VAR: &str = "VCAP_SERVICES";

/// Read-only view of environment variables
pub trait EnvSource {
    /// Raw value of `key`, if set
    fn var(&self, key: &str) -> Option<String>;

    /// Value of `key`, treating an empty string as unset
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| (*v).to_string())
    }
}
