//! Network clients
//!
//! HTTP clients for the indexer (node discovery) and the storage nodes
//! (fragment upload and download).
//!
//! Indexer: JSON-RPC 2.0 `indexer_selectNodes` with positional params
//! `[replicas, excludedUrls, method, trustedOnly]`, answering
//! `{"trusted": [{"url": ..}], "discovered": [..]}`.
//!
//! Storage node:
//! - `PUT {node}/file` with the fragment as body, answering
//!   `{"root": "0x..", "txHash": "0x.."}`
//! - `GET {node}/file/{root}?verifyProof=true` returning the raw bytes

use super::{
    NodeSelector, RemoteStore, SelectedNodes, SelectionRequest, StorageNode, StoreError,
    UploadReceipt,
};
use async_trait::async_trait;
use bytes::Bytes;
use fragcheck_core::ContentHandle;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

fn build_client(timeout: Duration) -> Result<Client, StoreError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn api_error(response: reqwest::Response) -> StoreError {
    StoreError::Api {
        status: response.status().as_u16(),
        message: response.text().await.unwrap_or_default(),
    }
}

// ==================== Indexer ====================

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Indexer client used for node selection
pub struct IndexerClient {
    client: Client,
    url: String,
}

impl IndexerClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<P, T>(&self, method: &str, params: P) -> Result<T, StoreError>
    where
        P: Serialize + Send,
        T: for<'de> Deserialize<'de>,
    {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let rpc: RpcResponse<T> = response.json().await?;
        if let Some(err) = rpc.error {
            return Err(StoreError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        rpc.result
            .ok_or_else(|| StoreError::InvalidResponse(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl NodeSelector for IndexerClient {
    async fn select_nodes(&self, request: &SelectionRequest) -> Result<SelectedNodes, StoreError> {
        let excluded: Vec<&str> = request.exclude.iter().map(|n| n.url.as_str()).collect();
        let params = (
            request.replicas,
            excluded,
            request.method.as_wire_str(),
            request.trusted_only,
        );

        debug!(
            indexer = %self.url,
            replicas = request.replicas,
            method = request.method.as_wire_str(),
            trusted_only = request.trusted_only,
            "Requesting storage nodes"
        );

        self.call("indexer_selectNodes", params).await
    }
}

// ==================== Storage nodes ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    root: String,
    tx_hash: Option<String>,
}

/// Storage node client. Every request is tried against the selected nodes
/// in order (trusted first) until one succeeds.
pub struct HttpStore {
    client: Client,
}

impl HttpStore {
    pub fn new(timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    async fn put_to(&self, node: &StorageNode, data: Bytes) -> Result<UploadReceipt, StoreError> {
        let url = format!("{}/file", node.url.trim_end_matches('/'));

        let response = self
            .client
            .put(&url)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: UploadResponse = response.json().await?;
        let root = ContentHandle::from_hex(&body.root)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(UploadReceipt {
            root,
            tx_hash: body.tx_hash,
        })
    }

    async fn get_from(
        &self,
        node: &StorageNode,
        handle: &ContentHandle,
        verify_proof: bool,
    ) -> Result<Bytes, StoreError> {
        let url = format!("{}/file/{}", node.url.trim_end_matches('/'), handle);

        let response = self
            .client
            .get(&url)
            .query(&[("verifyProof", verify_proof)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.bytes().await?)
        } else if response.status() == StatusCode::NOT_FOUND {
            Err(StoreError::NotFound(handle.to_hex()))
        } else {
            Err(api_error(response).await)
        }
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn put(&self, nodes: &SelectedNodes, data: Bytes) -> Result<UploadReceipt, StoreError> {
        let mut last_error = StoreError::NoNodes;

        for node in nodes.all() {
            match self.put_to(node, data.clone()).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) => {
                    warn!(node = %node.url, error = %e, "Upload to node failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn get(
        &self,
        nodes: &SelectedNodes,
        handle: &ContentHandle,
        verify_proof: bool,
    ) -> Result<Bytes, StoreError> {
        let mut last_error = StoreError::NoNodes;

        for node in nodes.all() {
            match self.get_from(node, handle, verify_proof).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    debug!(node = %node.url, error = %e, "Download from node failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
