//! Run orchestration
//!
//! Drives one demo run through its stages:
//!
//! ```text
//! Init -> Generated -> Fragmented -> SelectingNodes -> Uploading -> Uploaded
//!      -> Downloading -> Verified (per fragment) -> Merging -> Verified (whole) -> Done
//! ```
//!
//! Generation, fragmentation and merge failures abort the run, as does a
//! node selection that exhausts every strategy. A fragment that fails to
//! upload or download is recorded in its [`FragmentOutcome`] and the run
//! moves on to the next one. Verification mismatches are outcomes, never
//! errors.

use crate::config::FragcheckConfig;
use crate::store::{
    select_with_fallback, NodeSelector, RemoteStore, SelectedNodes, SelectionStrategy, StoreError,
    UploadReceipt,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fragcheck_core::{
    files_equal, generate_random_file, merge_files, split_file, ContentHandle, FragError, Fragment,
    WorkDir,
};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal run errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to generate source file: {0}")]
    Generate(#[source] FragError),

    #[error("Failed to fragment source file: {0}")]
    Fragment(#[source] FragError),

    #[error("Node selection failed: {0}")]
    NodeSelection(#[from] StoreError),

    #[error("Failed to merge fragments: {0}")]
    Merge(#[source] FragError),
}

/// Run stage, used to tag log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Generated,
    Fragmented,
    SelectingNodes,
    Uploading,
    Uploaded,
    Downloading,
    Verified,
    Merging,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Generated => "generated",
            Stage::Fragmented => "fragmented",
            Stage::SelectingNodes => "selecting_nodes",
            Stage::Uploading => "uploading",
            Stage::Uploaded => "uploaded",
            Stage::Downloading => "downloading",
            Stage::Verified => "verified",
            Stage::Merging => "merging",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Parameters of a single run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub total_size: u64,
    pub fragment_size: u64,
    pub replicas: usize,
    pub verify_proof: bool,
    pub strategies: Vec<SelectionStrategy>,
}

impl From<&FragcheckConfig> for PipelineConfig {
    fn from(config: &FragcheckConfig) -> Self {
        Self {
            total_size: config.run.total_size,
            fragment_size: config.run.fragment_size,
            replicas: config.run.replicas,
            verify_proof: config.run.verify_proof,
            strategies: config.node_selection.clone(),
        }
    }
}

/// What happened to one fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentOutcome {
    pub index: usize,
    pub size: u64,
    pub uploaded: bool,
    pub handle: Option<ContentHandle>,
    pub tx_hash: Option<String>,
    pub downloaded: bool,
    /// `None` until the downloaded copy has been compared
    pub verified: Option<bool>,
    /// Last upload or download error
    pub error: Option<String>,
}

impl FragmentOutcome {
    fn pending(fragment: &Fragment) -> Self {
        Self {
            index: fragment.index,
            size: fragment.len,
            uploaded: false,
            handle: None,
            tx_hash: None,
            downloaded: false,
            verified: None,
            error: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }
}

/// Node selection that the run used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub strategy: SelectionStrategy,
    /// One-based number of the strategy that succeeded
    pub attempt: usize,
    pub trusted: usize,
    pub discovered: usize,
}

/// Reassembly result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub path: PathBuf,
    pub bytes: u64,
    /// Number of downloaded fragments that went into the merge
    pub fragments: usize,
    pub verified: bool,
}

/// Structured result of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source: PathBuf,
    pub total_size: u64,
    pub fragment_size: u64,
    pub selection: Option<SelectionSummary>,
    pub fragments: Vec<FragmentOutcome>,
    pub merged: Option<MergeOutcome>,
}

impl RunReport {
    pub fn uploaded_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.uploaded).count()
    }

    pub fn downloaded_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.downloaded).count()
    }

    pub fn verified_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_verified()).count()
    }

    /// True when every fragment and the merged file verified.
    /// A run with nothing to transfer is trivially successful; a run where
    /// nothing came back has no merged file but unverified fragments.
    pub fn is_success(&self) -> bool {
        let fragments_ok = self.fragments.iter().all(FragmentOutcome::is_verified);
        let merged_ok = self.merged.as_ref().map_or(true, |m| m.verified);
        fragments_ok && merged_ok
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Fragment, upload, download, verify and merge against a store
pub struct Pipeline<'a> {
    store: &'a dyn RemoteStore,
    selector: &'a dyn NodeSelector,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn RemoteStore,
        selector: &'a dyn NodeSelector,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            selector,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one run inside `work`
    pub async fn run(&self, work: &WorkDir) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let total_size = self.config.total_size;
        let fragment_size = self.config.fragment_size;

        info!(
            stage = %Stage::Init,
            total_size,
            fragment_size,
            work_dir = %work.path().display(),
            "Starting run"
        );

        let source = work.source_path(total_size);
        generate_random_file(&source, total_size)
            .await
            .map_err(PipelineError::Generate)?;
        info!(stage = %Stage::Generated, path = %source.display(), bytes = total_size, "Generated source file");

        let fragments = split_file(&source, fragment_size, work.path())
            .await
            .map_err(PipelineError::Fragment)?;
        info!(stage = %Stage::Fragmented, count = fragments.len(), "Split source file");

        let mut report = RunReport {
            started_at,
            finished_at: started_at,
            source: source.clone(),
            total_size,
            fragment_size,
            selection: None,
            fragments: fragments.iter().map(FragmentOutcome::pending).collect(),
            merged: None,
        };

        if fragments.is_empty() {
            info!(stage = %Stage::Done, "Source is empty, nothing to transfer");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        info!(stage = %Stage::SelectingNodes, replicas = self.config.replicas, "Selecting storage nodes");
        let selection = select_with_fallback(
            self.selector,
            self.config.replicas,
            &[],
            &self.config.strategies,
        )
        .await?;
        let nodes = &selection.nodes;
        report.selection = Some(SelectionSummary {
            strategy: selection.strategy,
            attempt: selection.attempt + 1,
            trusted: nodes.trusted.len(),
            discovered: nodes.discovered.len(),
        });

        // Upload
        for (fragment, outcome) in fragments.iter().zip(report.fragments.iter_mut()) {
            debug!(stage = %Stage::Uploading, index = fragment.index, size = fragment.len, "Uploading fragment");

            match self.upload_fragment(nodes, fragment).await {
                Ok(receipt) => {
                    info!(
                        index = fragment.index,
                        root = %receipt.root,
                        tx_hash = receipt.tx_hash.as_deref().unwrap_or("-"),
                        "Uploaded fragment"
                    );
                    outcome.uploaded = true;
                    outcome.handle = Some(receipt.root);
                    outcome.tx_hash = receipt.tx_hash;
                }
                Err(e) => {
                    warn!(index = fragment.index, error = %e, "Fragment upload failed");
                    outcome.error = Some(e.to_string());
                }
            }
        }
        info!(
            stage = %Stage::Uploaded,
            uploaded = report.uploaded_count(),
            total = fragments.len(),
            "Upload finished"
        );

        // Download and verify
        for (fragment, outcome) in fragments.iter().zip(report.fragments.iter_mut()) {
            let Some(handle) = outcome.handle else {
                debug!(index = fragment.index, "Skipping download of fragment that was not uploaded");
                continue;
            };

            debug!(stage = %Stage::Downloading, index = fragment.index, root = %handle, "Downloading fragment");
            let target = work.downloaded_path(fragment.index);

            match self.download_fragment(nodes, &handle, &target).await {
                Ok(bytes) => {
                    outcome.downloaded = true;
                    let verified = files_equal(&fragment.path, &target).await;
                    outcome.verified = Some(verified);

                    if verified {
                        info!(stage = %Stage::Verified, index = fragment.index, bytes, "Fragment verified");
                    } else {
                        warn!(index = fragment.index, bytes, "Downloaded fragment differs from original");
                    }
                }
                Err(e) => {
                    warn!(index = fragment.index, root = %handle, error = %e, "Fragment download failed");
                    outcome.error = Some(e.to_string());
                }
            }
        }

        // Merge whatever came back, in index order
        let downloaded: Vec<PathBuf> = report
            .fragments
            .iter()
            .filter(|o| o.downloaded)
            .map(|o| work.downloaded_path(o.index))
            .collect();

        if downloaded.is_empty() {
            warn!(stage = %Stage::Merging, "No fragment was downloaded, skipping merge");
        } else {
            let merged_path = work.merged_path(total_size);
            info!(stage = %Stage::Merging, fragments = downloaded.len(), "Merging downloaded fragments");
            let bytes = merge_files(&downloaded, &merged_path)
                .await
                .map_err(PipelineError::Merge)?;

            let verified = files_equal(&source, &merged_path).await;
            if verified {
                info!(stage = %Stage::Verified, bytes, "Merged file matches source");
            } else {
                warn!(bytes, expected = total_size, "Merged file differs from source");
            }

            report.merged = Some(MergeOutcome {
                path: merged_path,
                bytes,
                fragments: downloaded.len(),
                verified,
            });
        }
        report.finished_at = Utc::now();

        info!(
            stage = %Stage::Done,
            verified = report.verified_count(),
            total = report.fragments.len(),
            success = report.is_success(),
            "Run finished"
        );
        Ok(report)
    }

    async fn upload_fragment(
        &self,
        nodes: &SelectedNodes,
        fragment: &Fragment,
    ) -> Result<UploadReceipt, StoreError> {
        let data = tokio::fs::read(&fragment.path).await?;
        self.store.put(nodes, Bytes::from(data)).await
    }

    async fn download_fragment(
        &self,
        nodes: &SelectedNodes,
        handle: &ContentHandle,
        target: &Path,
    ) -> Result<u64, StoreError> {
        let data = self
            .store
            .get(nodes, handle, self.config.verify_proof)
            .await?;
        tokio::fs::write(target, &data).await?;
        Ok(data.len() as u64)
    }
}
