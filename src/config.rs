use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::semantic::{DEFAULT_MODEL, DEFAULT_TOP_K};

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_CATALOG_PATH: &str = "../public/newsletters.json";
/// Budget for the embedding work of one request
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("environment variable {name} is invalid: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interface to bind, all interfaces by default
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Newsletter catalog, a JSON array of {title, description}.
    /// Relative paths resolve against the working directory.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_model")]
    pub model: String,

    /// How many recommendations a query returns
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Embed the catalog at startup instead of on the first request
    #[serde(default = "default_true")]
    pub warm_cache: bool,

    #[serde(skip_serializing, skip_deserializing)]
    pub(crate) base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: default_bind_addr(),
            catalog_path: default_catalog_path(),
            model: default_model(),
            top_k: DEFAULT_TOP_K,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            warm_cache: true,
            base_path: PathBuf::new(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_catalog_path() -> String {
    DEFAULT_CATALOG_PATH.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Directory holding config.yaml and downloaded models.
///
/// `NEWSFIND_BASE_PATH` if set, `~/.local/share/newsfind` otherwise.
pub fn base_path() -> PathBuf {
    if let Ok(path) = std::env::var("NEWSFIND_BASE_PATH") {
        return PathBuf::from(path);
    }

    match homedir::my_home() {
        Ok(Some(home)) => home.join(".local/share/newsfind"),
        _ => {
            log::warn!("could not determine home directory, using ./.newsfind");
            PathBuf::from(".newsfind")
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be greater than 0".into()));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.download_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "download_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }

        if self.catalog_path.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog_path must not be empty".into()));
        }

        self.socket_addr()?;

        Ok(())
    }

    /// Load `config.yaml` from `base_path` and apply environment overrides.
    ///
    /// A missing file means defaults; it is not created. The result is not
    /// validated, callers run `validate` once every override is in.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        let config_path = base_path.join(CONFIG_FILE);

        let mut config: Self = if config_path.exists() {
            let config_str =
                std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                    path: config_path.clone(),
                    source,
                })?;
            serde_yml::from_str(&config_str)?
        } else {
            Self::default()
        };

        config.base_path = base_path.to_path_buf();
        config.apply_env(|name| std::env::var(name).ok())?;

        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&base_path())
    }

    /// Apply environment overrides. `lookup` returns a variable's value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "PORT",
                    value: port,
                })?;
        }

        if let Some(catalog) = lookup("NEWSFIND_CATALOG") {
            self.catalog_path = catalog;
        }

        if let Some(model) = lookup("NEWSFIND_MODEL") {
            self.model = model;
        }

        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_addr.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "bind_addr {:?} is not a valid IP address",
                self.bind_addr
            ))
        })?;

        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.download_timeout_secs)
    }
}
