//! Configuration for dispatch-lookup

use std::path::{Path, PathBuf};
use std::time::Duration;

use dispatch_core::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::store::{FsStore, IpfsStore};

/// Where records are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// IPFS node RPC API
    #[default]
    Ipfs,
    /// Local content-addressed directory
    Fs,
}

/// Default config directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dispatch")
}

/// Default local record directory
pub fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dispatch")
        .join("records")
}

/// Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Record source
    #[serde(default)]
    pub backend: StoreBackend,

    /// IPFS node RPC API URL
    #[serde(default = "default_ipfs_api_url")]
    pub ipfs_api_url: String,

    /// Gateway used to complete DAGs missing from the node
    #[serde(default)]
    pub gateway: Option<String>,

    /// Directory of the `fs` backend
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Directory lookup results are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Timeout for store requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ipfs_api_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("lookups")
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            ipfs_api_url: default_ipfs_api_url(),
            gateway: None,
            store_dir: default_store_dir(),
            output_dir: default_output_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl LookupConfig {
    /// Default config file path
    pub fn default_path() -> PathBuf {
        default_config_dir().join("config.toml")
    }

    /// Parse config from TOML.
    pub fn from_toml(content: &str) -> Result<Self, LookupError> {
        toml::from_str(content).map_err(|e| LookupError::Config(e.to_string()))
    }

    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LookupError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LookupError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load the given file, or the default file if present, or defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, LookupError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LookupError> {
        let content = toml::to_string_pretty(self).map_err(|e| LookupError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Open the configured store.
    pub async fn open_store(&self) -> Result<Box<dyn ObjectStore>, LookupError> {
        let store: Box<dyn ObjectStore> = match self.backend {
            StoreBackend::Ipfs => Box::new(IpfsStore::new(
                self.ipfs_api_url.clone(),
                self.gateway.clone(),
                self.request_timeout(),
            )?),
            StoreBackend::Fs => Box::new(FsStore::new(&self.store_dir).await?),
        };
        Ok(store)
    }
}
