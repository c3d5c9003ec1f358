use std::path::PathBuf;

use thiserror::Error;

/// Local configuration problems detected before any request is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("operation name must not be empty")]
    EmptyOperation,

    #[error("API version must not be empty")]
    EmptyVersion,

    #[error("no server configured (use --server, PASM_SERVER or the config file)")]
    NoServer,

    #[error("invalid server URL {url:?}: {source}")]
    InvalidServer {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("server URL {0:?} cannot carry a path")]
    NotABase(String),

    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failures of the transport itself. HTTP error statuses are not transport
/// failures and never show up here. Display strings omit the source; print
/// with the full chain (`{:#}` through anyhow) to see the root cause.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read CA certificate {path:?}")]
    CaCertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CA certificate {path:?}")]
    CaCertInvalid {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("no certificates found in CA file {path:?}")]
    CaCertEmpty { path: PathBuf },

    #[error("{0}")]
    InvalidHeader(String),

    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    #[error("request failed")]
    Send(#[source] reqwest::Error),

    #[error("failed to read response body")]
    Body(#[source] reqwest::Error),
}
