//! Local directory store
//!
//! Content-addressed storage in a plain directory. Objects are keyed by
//! their Blake3 handle, and proof verification recomputes the handle of
//! the stored bytes. Used to run the demo without a network.

use super::{
    NodeSelector, RemoteStore, SelectedNodes, SelectionRequest, StorageNode, StoreError,
    UploadReceipt,
};
use async_trait::async_trait;
use bytes::Bytes;
use fragcheck_core::ContentHandle;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Directory-backed content-addressed store
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The single node this store presents to the pipeline
    pub fn node(&self) -> StorageNode {
        StorageNode::new(format!("file://{}", self.root.display()))
    }

    fn object_path(&self, handle: &ContentHandle) -> PathBuf {
        self.root.join(format!("{}.bin", hex_digits(handle)))
    }
}

fn hex_digits(handle: &ContentHandle) -> String {
    handle.to_hex().trim_start_matches("0x").to_string()
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn put(&self, _nodes: &SelectedNodes, data: Bytes) -> Result<UploadReceipt, StoreError> {
        let root = ContentHandle::compute(&data);
        let path = self.object_path(&root);

        if fs::try_exists(&path).await? {
            debug!(handle = %root, "Object already stored");
        } else {
            fs::write(&path, &data).await?;
            debug!(handle = %root, size = data.len(), "Stored object");
        }

        Ok(UploadReceipt {
            root,
            tx_hash: None,
        })
    }

    async fn get(
        &self,
        _nodes: &SelectedNodes,
        handle: &ContentHandle,
        verify_proof: bool,
    ) -> Result<Bytes, StoreError> {
        let path = self.object_path(handle);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(handle.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };

        if verify_proof && !handle.verify(&data) {
            return Err(StoreError::ProofMismatch(*handle));
        }

        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl NodeSelector for LocalStore {
    async fn select_nodes(&self, request: &SelectionRequest) -> Result<SelectedNodes, StoreError> {
        let node = self.node();
        if request.exclude.contains(&node) {
            return Ok(SelectedNodes::default());
        }

        Ok(SelectedNodes {
            trusted: vec![node],
            discovered: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SelectionMethod;
    use tempfile::TempDir;

    async fn open() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("store")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (_dir, store) = open().await;
        let nodes = SelectedNodes::default();

        let receipt = store
            .put(&nodes, Bytes::from_static(b"fragment bytes"))
            .await
            .unwrap();
        assert_eq!(receipt.root, ContentHandle::compute(b"fragment bytes"));
        assert!(receipt.tx_hash.is_none());

        let data = store.get(&nodes, &receipt.root, true).await.unwrap();
        assert_eq!(data.as_ref(), b"fragment bytes");
    }

    #[tokio::test]
    async fn test_missing_object() {
        let (_dir, store) = open().await;
        let handle = ContentHandle::compute(b"never stored");

        let result = store.get(&SelectedNodes::default(), &handle, true).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_proof_check_catches_tampering() {
        let (_dir, store) = open().await;
        let nodes = SelectedNodes::default();
        let receipt = store.put(&nodes, Bytes::from_static(b"original")).await.unwrap();

        // Tamper with the stored object
        std::fs::write(store.object_path(&receipt.root), b"tampered").unwrap();

        let result = store.get(&nodes, &receipt.root, true).await;
        assert!(matches!(result, Err(StoreError::ProofMismatch(_))));

        // Without the proof check the bytes come back as stored
        let data = store.get(&nodes, &receipt.root, false).await.unwrap();
        assert_eq!(data.as_ref(), b"tampered");
    }

    #[tokio::test]
    async fn test_selects_single_trusted_node() {
        let (_dir, store) = open().await;
        let request = SelectionRequest {
            replicas: 1,
            exclude: vec![],
            method: SelectionMethod::Default,
            trusted_only: true,
        };

        let nodes = store.select_nodes(&request).await.unwrap();
        assert_eq!(nodes.trusted, vec![store.node()]);
        assert!(nodes.discovered.is_empty());
    }
}
