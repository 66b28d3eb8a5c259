//! Layered configuration.
//!
//! Values are merged, later sources winning:
//!
//! 1. built-in defaults,
//! 2. an optional config file (TOML, YAML or JSON, picked by extension),
//! 3. environment variables prefixed with `FAKIT_`, nested keys separated
//!    by `__` (e.g. `FAKIT_API__TOKEN`, `FAKIT_DOWNLOAD__TIMEOUT_SECS`).

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_PREFIX: &str = "FAKIT_";
pub const DEFAULT_BASE_URL: &str = "https://api.fontawesome.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub query: QueryConfig,
    pub download: DownloadConfig,
    /// Base directory that kits are published under.
    pub destination: PathBuf,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Long-lived API token. Only required for authenticated requests.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
    /// Where per-download temporary directories are created.
    pub temp_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let destination = directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join("fakit"))
            .unwrap_or_else(|| std::env::temp_dir().join("fakit"));
        Self {
            api: ApiConfig::default(),
            query: QueryConfig::default(),
            download: DownloadConfig::default(),
            destination,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), token: None }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { timeout_secs: 30, temp_dir: std::env::temp_dir() }
    }
}

impl Config {
    /// Load from defaults, `file` (if given) and the environment, then validate.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(file)?)
    }

    /// The merged sources, before extraction. Useful for layering extra
    /// providers on top.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            debug!(path = %file.display(), "loading configuration file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                Some("json") => figment.merge(Json::file_exact(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.api.base_url;
        let host = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"));
        if !host.is_some_and(|host| !host.trim_matches('/').is_empty()) {
            exn::bail!(ErrorKind::Invalid("api.base_url"));
        }
        if self.api.token.as_deref().is_some_and(|token| token.trim().is_empty()) {
            exn::bail!(ErrorKind::Invalid("api.token"));
        }
        if self.query.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("query.timeout_secs"));
        }
        if self.download.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("download.timeout_secs"));
        }
        if !self.download.temp_dir.is_absolute() {
            exn::bail!(ErrorKind::Invalid("download.temp_dir"));
        }
        if !self.destination.is_absolute() {
            exn::bail!(ErrorKind::Invalid("destination"));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query.timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }
}
