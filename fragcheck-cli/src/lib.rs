//! fragcheck Client Library
//!
//! Drives the fragment demo against a storage network:
//! - Configuration loading (file, environment, CLI overrides)
//! - Wallet address sanity check for the configured private key
//! - Storage facade traits with a local and an HTTP implementation
//! - Node selection with an ordered fallback over strategies
//! - The run pipeline producing a per-fragment report

pub mod commands;
pub mod config;
pub mod identity;
pub mod pipeline;
pub mod store;
pub mod symbols;

pub use config::{
    Backend, ConfigError, FragcheckConfig, NetworkConfig, RunConfig, StoreConfig, WalletConfig,
};
pub use identity::{check_address, check_key, derive_address, Address, AddressCheck, IdentityError};
pub use pipeline::{
    FragmentOutcome, MergeOutcome, Pipeline, PipelineConfig, PipelineError, RunReport,
    SelectionSummary, Stage,
};
pub use store::{
    default_strategies, select_with_fallback, HttpStore, IndexerClient, LocalStore, NodeSelector,
    RemoteStore, SelectedNodes, Selection, SelectionMethod, SelectionRequest, SelectionStrategy,
    StorageNode, StoreError, UploadReceipt,
};
