use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_VERSION: &str = "1.0";

/// On-disk configuration. Every field is optional; flags and environment
/// variables take precedence over whatever is stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_header: Option<String>,
}

/// `$XDG_CONFIG_HOME/pasmcli/config.toml`, else `~/.config/pasmcli/config.toml`
/// on every platform.
pub fn default_config_path() -> PathBuf {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )
}

fn config_path_from(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| home.map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("pasmcli").join("config.toml")
}

impl Config {
    /// Loads the config file, treating a missing file as an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(write_err)
    }
}

/// How the auth token travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAuth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `<name>: <token>`
    Header { name: String, value: String },
}

/// Effective settings for one invocation, handed explicitly to the endpoint
/// resolver and the transport.
#[derive(Debug, Clone)]
pub struct Settings {
    pub default_host: Option<String>,
    pub api_version: String,
    pub ca_cert: Option<PathBuf>,
    pub auth: Option<TokenAuth>,
    pub timeout: Duration,
}

/// Values supplied on the command line (or through their env fallbacks).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub api_version: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub token: Option<String>,
    pub token_header: Option<String>,
    pub timeout: Duration,
}

impl Settings {
    pub fn merge(overrides: Overrides, cfg: &Config) -> Self {
        let token = overrides.token.or_else(|| cfg.token.clone());
        let header = overrides
            .token_header
            .or_else(|| cfg.token_header.clone())
            .filter(|h| !h.is_empty());
        let auth = token.filter(|t| !t.is_empty()).map(|t| match header {
            Some(name) if !name.eq_ignore_ascii_case("authorization") => {
                TokenAuth::Header { name, value: t }
            }
            _ => TokenAuth::Bearer(t),
        });

        Self {
            default_host: overrides
                .server
                .or_else(|| cfg.server.clone())
                .filter(|s| !s.is_empty()),
            api_version: overrides
                .api_version
                .or_else(|| cfg.api_version.clone())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            ca_cert: overrides.ca_cert.or_else(|| cfg.ca_cert.clone()),
            auth,
            timeout: overrides.timeout,
        }
    }

    /// Folds the effective connection settings back into `cfg` for `--save-config`.
    pub fn store_into(&self, cfg: &mut Config) {
        if let Some(host) = &self.default_host {
            cfg.server = Some(host.clone());
        }
        if let Some(ca) = &self.ca_cert {
            cfg.ca_cert = Some(ca.clone());
        }
        match &self.auth {
            Some(TokenAuth::Bearer(t)) => {
                cfg.token = Some(t.clone());
                cfg.token_header = None;
            }
            Some(TokenAuth::Header { name, value }) => {
                cfg.token = Some(value.clone());
                cfg.token_header = Some(name.clone());
            }
            None => {}
        }
    }
}
