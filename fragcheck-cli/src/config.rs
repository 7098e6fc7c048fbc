//! Configuration
//!
//! Config file format (fragcheck.toml, every section optional):
//! ```toml
//! [network]
//! evm_rpc = "https://evmrpc-testnet.0g.ai"
//! indexer_rpc = "https://indexer-storage-testnet-turbo.0g.ai"
//!
//! [wallet]
//! private_key = "..."
//! expected_address = "0x..."
//!
//! [run]
//! replicas = 1
//! total_size = 1024
//! fragment_size = 256
//! work_dir = "temp_data"
//! verify_proof = true
//!
//! [store]
//! backend = "local"
//! request_timeout_secs = 300
//!
//! [[node_selection]]
//! method = "default"
//! trusted_only = true
//! ```
//!
//! Priority: CLI args > environment (`FRAGCHECK_*`) > config file > defaults.

use crate::store::{default_strategies, SelectionStrategy};
use fragcheck_core::{DEFAULT_FRAGMENT_SIZE, DEFAULT_TOTAL_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Complete fragcheck configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragcheckConfig {
    /// Ledger and indexer endpoints
    #[serde(default)]
    pub network: NetworkConfig,

    /// Key material for the address check
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Demo run parameters
    #[serde(default)]
    pub run: RunConfig,

    /// Storage backend settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Node selection strategies, tried in order
    #[serde(default = "default_strategies")]
    pub node_selection: Vec<SelectionStrategy>,
}

impl Default for FragcheckConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            wallet: WalletConfig::default(),
            run: RunConfig::default(),
            store: StoreConfig::default(),
            node_selection: default_strategies(),
        }
    }
}

/// Network endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ledger JSON-RPC endpoint (transactions are signed against it)
    #[serde(default = "default_evm_rpc")]
    pub evm_rpc: String,

    /// Indexer endpoint used for node discovery
    #[serde(default = "default_indexer_rpc")]
    pub indexer_rpc: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            evm_rpc: default_evm_rpc(),
            indexer_rpc: default_indexer_rpc(),
        }
    }
}

fn default_evm_rpc() -> String {
    std::env::var("FRAGCHECK_EVM_RPC").unwrap_or_else(|_| "https://evmrpc-testnet.0g.ai".to_string())
}

fn default_indexer_rpc() -> String {
    std::env::var("FRAGCHECK_INDEXER_RPC")
        .unwrap_or_else(|_| "https://indexer-storage-testnet-turbo.0g.ai".to_string())
}

/// Wallet settings
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Hex private key (with or without 0x)
    #[serde(default)]
    pub private_key: Option<String>,

    /// Address the private key is expected to control
    #[serde(default)]
    pub expected_address: Option<String>,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expected_address", &self.expected_address)
            .finish()
    }
}

/// Demo run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Replicas requested from node selection
    #[serde(default = "default_replicas")]
    pub replicas: usize,

    /// Size of the generated source file in bytes
    #[serde(default = "default_total_size")]
    pub total_size: u64,

    /// Fragment size in bytes
    #[serde(default = "default_fragment_size")]
    pub fragment_size: u64,

    /// Directory for every temporary file of the run
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Ask the store to verify its integrity proof on download
    #[serde(default = "default_true")]
    pub verify_proof: bool,

    /// Leave the work directory on disk after the run
    #[serde(default)]
    pub keep_work_dir: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            total_size: default_total_size(),
            fragment_size: default_fragment_size(),
            work_dir: default_work_dir(),
            verify_proof: true,
            keep_work_dir: false,
        }
    }
}

fn default_replicas() -> usize {
    1
}

fn default_total_size() -> u64 {
    DEFAULT_TOTAL_SIZE
}

fn default_fragment_size() -> u64 {
    DEFAULT_FRAGMENT_SIZE
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("temp_data")
}

fn default_true() -> bool {
    true
}

/// Which storage implementation to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Content-addressed directory inside the work directory
    #[default]
    Local,
    /// Indexer and storage nodes over HTTP
    Http,
}

/// Storage backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Directory for the local backend (defaults to `<work_dir>/store`)
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            local_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FragcheckConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: FragcheckConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults.
    ///
    /// A missing file is normal; an unreadable or invalid one is logged.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Write configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.fragment_size == 0 {
            return Err(ConfigError::ValidationError(
                "fragment_size must be greater than zero".to_string(),
            ));
        }

        if self.run.replicas == 0 {
            return Err(ConfigError::ValidationError(
                "replicas must be at least 1".to_string(),
            ));
        }

        if self.node_selection.is_empty() {
            return Err(ConfigError::ValidationError(
                "node_selection needs at least one strategy".to_string(),
            ));
        }

        if self.store.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Override config with environment variables
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `FRAGCHECK_*` overrides resolved through `lookup`
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FRAGCHECK_EVM_RPC") {
            self.network.evm_rpc = url;
        }
        if let Some(url) = lookup("FRAGCHECK_INDEXER_RPC") {
            self.network.indexer_rpc = url;
        }
        if let Some(key) = lookup("FRAGCHECK_PRIVATE_KEY") {
            self.wallet.private_key = Some(key);
        }
        if let Some(address) = lookup("FRAGCHECK_EXPECTED_ADDRESS") {
            self.wallet.expected_address = Some(address);
        }
        if let Some(replicas) = lookup("FRAGCHECK_REPLICAS") {
            if let Ok(n) = replicas.parse() {
                self.run.replicas = n;
            }
        }
        if let Some(size) = lookup("FRAGCHECK_TOTAL_SIZE") {
            if let Ok(n) = size.parse() {
                self.run.total_size = n;
            }
        }
        if let Some(size) = lookup("FRAGCHECK_FRAGMENT_SIZE") {
            if let Ok(n) = size.parse() {
                self.run.fragment_size = n;
            }
        }
        if let Some(dir) = lookup("FRAGCHECK_WORK_DIR") {
            self.run.work_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("FRAGCHECK_BACKEND") {
            match backend.to_lowercase().as_str() {
                "local" => self.store.backend = Backend::Local,
                "http" => self.store.backend = Backend::Http,
                other => tracing::warn!(backend = other, "Unknown FRAGCHECK_BACKEND, ignoring"),
            }
        }
        self
    }

    /// Directory used by the local backend
    pub fn local_store_dir(&self) -> PathBuf {
        self.store
            .local_dir
            .clone()
            .unwrap_or_else(|| self.run.work_dir.join("store"))
    }
}
