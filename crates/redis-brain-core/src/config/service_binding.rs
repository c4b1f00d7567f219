//! Cloud Foundry service bindings
//!
//! `VCAP_SERVICES` maps a service label to the list of bound instances:
//!
//! ```json
//! { "p-redis": [ { "name": "bot-cache",
//!                  "credentials": { "host": "10.0.0.5", "port": 6379, "password": "s3cret" } } ] }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Service descriptor, either raw JSON text or an already parsed document
#[derive(Debug, Clone, Copy)]
pub enum ServiceDescriptor<'a> {
    /// JSON text as found in the environment
    Json(&'a str),
    /// Parsed descriptor supplied by an embedding host
    Parsed(&'a Value),
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    port: Option<Port>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Port {
    Number(u16),
    Text(String),
}

/// Build the Redis URL for `instance` of `service` in the descriptor.
///
/// The instance name becomes the key prefix:
/// `redis://:{password}@{host}:{port}/{instance}`.
///
/// # Errors
///
/// Returns [`Error::ServiceBinding`] if the descriptor is malformed, or the
/// service, the instance or one of its credentials is missing.
pub fn service_binding_url(
    descriptor: ServiceDescriptor<'_>,
    service: &str,
    instance: &str,
) -> Result<String> {
    let parsed;
    let root = match descriptor {
        ServiceDescriptor::Json(text) => {
            parsed = serde_json::from_str::<Value>(text)
                .map_err(|e| binding(format!("VCAP_SERVICES is not valid JSON: {}", e)))?;
            &parsed
        }
        ServiceDescriptor::Parsed(value) => value,
    };

    let instances = root
        .get(service)
        .and_then(Value::as_array)
        .ok_or_else(|| binding(format!("service '{}' not found", service)))?;

    let entry = instances
        .iter()
        .find(|i| i.get("name").and_then(Value::as_str) == Some(instance))
        .ok_or_else(|| {
            binding(format!(
                "instance '{}' not found in service '{}'",
                instance, service
            ))
        })?;

    let credentials = entry
        .get("credentials")
        .cloned()
        .ok_or_else(|| binding(format!("instance '{}' has no credentials", instance)))?;
    let credentials: Credentials = serde_json::from_value(credentials)
        .map_err(|e| binding(format!("instance '{}' credentials: {}", instance, e)))?;

    let host = credentials
        .hostname
        .or(credentials.host)
        .ok_or_else(|| binding(format!("instance '{}' has no host", instance)))?;
    let port = match credentials.port {
        Some(Port::Number(port)) => port,
        Some(Port::Text(text)) => text
            .parse()
            .map_err(|_| binding(format!("instance '{}' has invalid port '{}'", instance, text)))?,
        None => return Err(binding(format!("instance '{}' has no port", instance))),
    };
    let password = credentials
        .password
        .ok_or_else(|| binding(format!("instance '{}' has no password", instance)))?;

    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host
    };

    let mut url = Url::parse(&format!("redis://{}:{}/", host, port))
        .map_err(|e| binding(format!("instance '{}' has invalid host: {}", instance, e)))?;
    url.set_password(Some(&password))
        .map_err(|_| binding(format!("instance '{}' password rejected", instance)))?;
    url.set_path(&format!("/{}", urlencoding::encode(instance)));

    Ok(url.to_string())
}

fn binding(message: String) -> Error {
    Error::ServiceBinding(message)
}
