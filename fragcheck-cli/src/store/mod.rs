//! Storage facade
//!
//! The demo never talks to a storage network directly. Uploads, downloads
//! and node discovery go through the [`RemoteStore`] and [`NodeSelector`]
//! traits so the pipeline can run against a real network, a local
//! directory, or a test double.

pub mod http;
pub mod local;
pub mod selection;

pub use http::{HttpStore, IndexerClient};
pub use local::LocalStore;
pub use selection::{
    default_strategies, select_with_fallback, Selection, SelectionMethod, SelectionStrategy,
};

use async_trait::async_trait;
use bytes::Bytes;
use fragcheck_core::ContentHandle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage facade errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Proof verification failed for {0}")]
    ProofMismatch(ContentHandle),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No storage nodes available")]
    NoNodes,

    #[error("All {attempts} node selection strategies failed, last error: {last}")]
    SelectionExhausted { attempts: usize, last: String },
}

/// A storage node endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageNode {
    pub url: String,
}

impl StorageNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Nodes chosen for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedNodes {
    /// Nodes vouched for by the indexer
    #[serde(default)]
    pub trusted: Vec<StorageNode>,

    /// Nodes found through discovery
    #[serde(default)]
    pub discovered: Vec<StorageNode>,
}

impl SelectedNodes {
    /// Trusted nodes first, then discovered ones
    pub fn all(&self) -> impl Iterator<Item = &StorageNode> {
        self.trusted.iter().chain(self.discovered.iter())
    }

    pub fn len(&self) -> usize {
        self.trusted.len() + self.discovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parameters of one node selection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Number of replicas each fragment should be stored with
    pub replicas: usize,
    /// Nodes that must not be returned
    pub exclude: Vec<StorageNode>,
    pub method: SelectionMethod,
    /// Only return trusted nodes
    pub trusted_only: bool,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Content handle to download the fragment with
    pub root: ContentHandle,
    /// Ledger transaction that registered the upload, when the store has one
    pub tx_hash: Option<String>,
}

/// Content-addressed put/get
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upload a fragment
    async fn put(&self, nodes: &SelectedNodes, data: Bytes) -> Result<UploadReceipt, StoreError>;

    /// Download a fragment, optionally checking the store's integrity proof
    async fn get(
        &self,
        nodes: &SelectedNodes,
        handle: &ContentHandle,
        verify_proof: bool,
    ) -> Result<Bytes, StoreError>;
}

/// Storage node discovery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeSelector: Send + Sync {
    async fn select_nodes(&self, request: &SelectionRequest) -> Result<SelectedNodes, StoreError>;
}
