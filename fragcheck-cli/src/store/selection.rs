//! Node selection fallback
//!
//! Selection is attempted with each strategy in order until one succeeds.
//! The strategy list is plain data, so adding a strategy means adding an
//! entry rather than another branch.

use super::{NodeSelector, SelectedNodes, SelectionRequest, StorageNode, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// How the indexer picks nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Indexer default policy
    Default,
    /// Random pick among eligible nodes
    Random,
}

impl SelectionMethod {
    /// Value sent to the indexer (empty string selects its default)
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            SelectionMethod::Default => "",
            SelectionMethod::Random => "random",
        }
    }
}

/// One `(method, trusted_only)` combination to try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionStrategy {
    pub method: SelectionMethod,
    pub trusted_only: bool,
}

impl SelectionStrategy {
    pub const fn new(method: SelectionMethod, trusted_only: bool) -> Self {
        Self {
            method,
            trusted_only,
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self.method {
            SelectionMethod::Default => "default",
            SelectionMethod::Random => "random",
        };
        let pool = if self.trusted_only { "trusted" } else { "mixed" };
        write!(f, "{} method, {} nodes", method, pool)
    }
}

/// Strategies in the order they are tried
pub fn default_strategies() -> Vec<SelectionStrategy> {
    vec![
        SelectionStrategy::new(SelectionMethod::Default, true),
        SelectionStrategy::new(SelectionMethod::Default, false),
        SelectionStrategy::new(SelectionMethod::Random, true),
        SelectionStrategy::new(SelectionMethod::Random, false),
    ]
}

/// Outcome of a successful selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub nodes: SelectedNodes,
    /// Strategy that produced the nodes
    pub strategy: SelectionStrategy,
    /// Zero-based position of that strategy in the list
    pub attempt: usize,
}

/// Try each strategy in order and return the first success.
///
/// Fails with [`StoreError::SelectionExhausted`] when every strategy fails,
/// and with [`StoreError::NoNodes`] when the winning strategy returns an
/// empty node set.
pub async fn select_with_fallback<N>(
    selector: &N,
    replicas: usize,
    exclude: &[StorageNode],
    strategies: &[SelectionStrategy],
) -> Result<Selection, StoreError>
where
    N: NodeSelector + ?Sized,
{
    let mut last_error: Option<StoreError> = None;

    for (attempt, strategy) in strategies.iter().enumerate() {
        let request = SelectionRequest {
            replicas,
            exclude: exclude.to_vec(),
            method: strategy.method,
            trusted_only: strategy.trusted_only,
        };

        match selector.select_nodes(&request).await {
            Ok(nodes) => {
                if nodes.is_empty() {
                    return Err(StoreError::NoNodes);
                }

                info!(
                    attempt = attempt + 1,
                    strategy = %strategy,
                    trusted = nodes.trusted.len(),
                    discovered = nodes.discovered.len(),
                    "Selected storage nodes"
                );

                return Ok(Selection {
                    nodes,
                    strategy: *strategy,
                    attempt,
                });
            }
            Err(e) => {
                warn!(
                    attempt = attempt + 1,
                    strategy = %strategy,
                    error = %e,
                    "Node selection strategy failed"
                );
                last_error = Some(e);
            }
        }
    }

    Err(StoreError::SelectionExhausted {
        attempts: strategies.len(),
        last: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no strategies configured".to_string()),
    })
}
