//! Connection target parsed from a Redis URL

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Prefix used when the URL does not name one
pub const DEFAULT_PREFIX: &str = "hubot";

/// Port used when the URL does not name one
pub const DEFAULT_PORT: u16 = 6379;

/// Where the Redis server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// TCP host and port
    Tcp {
        /// Host name or address (IPv6 keeps its brackets)
        host: String,
        /// TCP port
        port: u16,
    },
    /// UNIX domain socket
    Unix {
        /// Socket path
        path: PathBuf,
    },
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Self::Unix { path } => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Resolved connection target
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug)]
pub struct ConnectionTarget {
    addr: TargetAddr,
    password: Option<SecretString>,
    has_auth: bool,
    prefix: String,
}

impl ConnectionTarget {
    /// Parse a `redis://` URL.
    ///
    /// An empty host selects the UNIX socket form, where the path is the socket
    /// and the query string is the prefix. Otherwise the first path segment is
    /// the prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed or does not use
    /// the `redis` scheme.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| invalid(raw, e.to_string()))?;

        if url.scheme() != "redis" {
            return Err(invalid(
                raw,
                format!("unsupported scheme '{}', expected 'redis'", url.scheme()),
            ));
        }

        let password = match url.password() {
            Some(encoded) => Some(SecretString::from(decode(raw, encoded)?)),
            None => None,
        };

        let has_auth = password.is_some() || !url.username().is_empty();

        let host = url.host_str().unwrap_or_default();
        if host.is_empty() {
            if url.path().is_empty() || url.path() == "/" {
                return Err(invalid(raw, "missing host or socket path".to_string()));
            }
            return Ok(Self {
                addr: TargetAddr::Unix {
                    path: PathBuf::from(decode(raw, url.path())?),
                },
                password,
                has_auth,
                prefix: prefix_or_default(url.query().map(|q| decode(raw, q)).transpose()?),
            });
        }

        let segment = url.path().strip_prefix('/').unwrap_or(url.path());
        Ok(Self {
            addr: TargetAddr::Tcp {
                host: host.to_string(),
                port: url.port().unwrap_or(DEFAULT_PORT),
            },
            password,
            has_auth,
            prefix: prefix_or_default(Some(decode(raw, segment)?)),
        })
    }

    /// Server address
    #[must_use]
    pub fn addr(&self) -> &TargetAddr {
        &self.addr
    }

    /// Socket path, for the UNIX socket form
    #[must_use]
    pub fn socket_path(&self) -> Option<&Path> {
        match &self.addr {
            TargetAddr::Unix { path } => Some(path),
            TargetAddr::Tcp { .. } => None,
        }
    }

    /// Password carried inline in the URL
    #[must_use]
    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    /// Whether the URL carried an auth section (`user@`, `:password@` or both).
    ///
    /// A username alone counts, but only a password is sent with `AUTH`.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.has_auth
    }

    /// Key namespace
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The single key the brain is stored under
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}:storage", self.prefix)
    }
}

/// Replace any password in `raw` with `***`, for logs and error messages.
#[must_use]
pub fn mask_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                "<redacted>".to_string()
            }
        }
        Ok(url) => url.to_string(),
        Err(_) if raw.contains('@') => "<redacted>".to_string(),
        Err(_) => raw.to_string(),
    }
}

fn prefix_or_default(prefix: Option<String>) -> String {
    prefix
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string())
}

fn decode(raw: &str, part: &str) -> Result<String> {
    urlencoding::decode(part)
        .map(|s| s.into_owned())
        .map_err(|e| invalid(raw, e.to_string()))
}

fn invalid(raw: &str, message: String) -> Error {
    Error::InvalidUrl {
        url: mask_url(raw),
        message,
    }
}
