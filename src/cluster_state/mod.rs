//! Aggregates the most recently reported `NodeState` per node.
//!
//! There is no persistence and no expiration here: a stale report from a
//! node that has gone away remains until overwritten.
//! Two nodes reporting themselves primary for the same dataset is likewise
//! not resolved here; it is an open invariant violation, not a runtime error.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::{Deployment, NodeState};

/// Owns the hostname→`NodeState` mapping built from agent reports.
pub struct ClusterStateService {
    nodes: RwLock<HashMap<String, NodeState>>,
}

impl Default for ClusterStateService {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterStateService {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `node_state` keyed by its hostname; last writer for a given
    /// hostname wins.
    pub fn update_node_state(&self, node_state: NodeState) {
        log::debug!(target: "cluster_state", "updating reported state for {}", node_state.hostname);
        self.nodes.write().insert(node_state.hostname.clone(), node_state);
    }

    /// Synthesizes a `Deployment` from every node's latest report.
    pub fn as_deployment(&self) -> Deployment {
        let nodes = self.nodes.read();
        Deployment::from_node_states(nodes.values())
    }
}
