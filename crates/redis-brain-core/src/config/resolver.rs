//! Connection target resolution
//!
//! Picks the source URL from the environment and turns it into a
//! [`BrainConfig`]. No network I/O happens here.

use super::env::{
    EnvSource, NO_READY_CHECK_VAR, SERVICES_DESCRIPTOR_VAR, SERVICE_INSTANCE_VAR,
    SERVICE_NAME_VAR, URL_VARS,
};
use super::service_binding::{service_binding_url, ServiceDescriptor};
use super::target::{mask_url, ConnectionTarget};
use crate::error::{Error, Result};
use std::fmt;
use tracing::debug;

/// URL used when nothing in the environment names one
pub const DEFAULT_URL: &str = "redis://localhost:6379";

/// Where the source URL came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    /// One of the generic URL variables
    Env(&'static str),
    /// Platform service binding
    ServiceBinding {
        /// Service label
        service: String,
        /// Instance name
        instance: String,
    },
    /// Nothing configured
    Default,
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(var) => write!(f, "${}", var),
            Self::ServiceBinding { service, instance } => {
                write!(f, "service binding {}/{}", service, instance)
            }
            Self::Default => write!(f, "default"),
        }
    }
}

/// Adapter configuration, built once and passed by value
#[derive(Debug)]
pub struct BrainConfig {
    /// Resolved URL with any password masked
    pub display_url: String,
    /// Where the URL came from
    pub source: UrlSource,
    /// Parsed target
    pub target: ConnectionTarget,
    /// `REDIS_NO_CHECK` was set
    pub no_ready_check: bool,
}

impl BrainConfig {
    /// Resolve the configuration from an environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if the service binding cannot be resolved or the URL
    /// cannot be parsed.
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Result<Self> {
        let (url, source) = resolve_url(env)?;
        let no_ready_check = env.non_empty(NO_READY_CHECK_VAR).is_some();
        Self::from_url(&url, source, no_ready_check)
    }

    /// Build the configuration from an explicit URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn from_url(url: &str, source: UrlSource, no_ready_check: bool) -> Result<Self> {
        let target = ConnectionTarget::parse(url)?;
        let display_url = mask_url(url);
        debug!(url = %display_url, source = %source, prefix = %target.prefix(), "Resolved Redis target");

        Ok(Self {
            display_url,
            source,
            target,
            no_ready_check,
        })
    }

    /// Whether the `PING` ready check is skipped.
    ///
    /// Inline credentials also skip it: some authenticating proxies do not
    /// answer the check.
    #[must_use]
    pub fn skip_ready_check(&self) -> bool {
        self.no_ready_check || self.target.has_credentials()
    }
}

/// Pick the source URL: generic URL variables first, then the platform
/// service binding, then [`DEFAULT_URL`].
///
/// # Errors
///
/// Returns [`Error::ServiceBinding`] when the service-binding path is selected
/// but cannot be resolved.
pub fn resolve_url<E: EnvSource + ?Sized>(env: &E) -> Result<(String, UrlSource)> {
    for var in URL_VARS {
        if let Some(url) = env.non_empty(var) {
            return Ok((url, UrlSource::Env(var)));
        }
    }

    if let Some(instance) = env.non_empty(SERVICE_INSTANCE_VAR) {
        let service = env.non_empty(SERVICE_NAME_VAR).ok_or_else(|| {
            Error::ServiceBinding(format!(
                "{} is set but {} is not",
                SERVICE_INSTANCE_VAR, SERVICE_NAME_VAR
            ))
        })?;
        let descriptor = env.non_empty(SERVICES_DESCRIPTOR_VAR).ok_or_else(|| {
            Error::ServiceBinding(format!("{} is not set", SERVICES_DESCRIPTOR_VAR))
        })?;
        let url = service_binding_url(
            ServiceDescriptor::Json(descriptor.as_str()),
            &service,
            &instance,
        )?;
        return Ok((url, UrlSource::ServiceBinding { service, instance }));
    }

    Ok((DEFAULT_URL.to_string(), UrlSource::Default))
}
