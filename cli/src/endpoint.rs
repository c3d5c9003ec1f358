use std::fmt;

use url::Url;

use crate::config::Settings;
use crate::error::ConfigError;

/// A fully-qualified operation URL: `<host>/<version>/<operation>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Resolves an operation URL against `settings`. An empty `host_override`
/// falls back to the configured default host.
pub fn resolve(
    settings: &Settings,
    host_override: &str,
    version: &str,
    operation: &str,
) -> Result<Endpoint, ConfigError> {
    if operation.is_empty() {
        return Err(ConfigError::EmptyOperation);
    }
    if version.is_empty() {
        return Err(ConfigError::EmptyVersion);
    }

    let host = if host_override.is_empty() {
        settings
            .default_host
            .as_deref()
            .ok_or(ConfigError::NoServer)?
    } else {
        host_override
    };

    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    let mut url = Url::parse(&with_scheme).map_err(|source| ConfigError::InvalidServer {
        url: host.to_string(),
        source,
    })?;

    url.path_segments_mut()
        .map_err(|_| ConfigError::NotABase(host.to_string()))?
        .pop_if_empty()
        .push(version)
        .push(operation);

    tracing::debug!(endpoint = %url, "resolved endpoint");
    Ok(Endpoint(url))
}
