use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::manifestation::Manifestation;
use super::node::{ApplicationByName, ManifestationByDatasetId, Node};
use super::node_state::NodeState;

/// Wrapper giving `Node` a total, stable order by `hostname`, so a
/// `Deployment`'s node set always encodes as an array sorted by hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeByHostname(pub Node);

impl PartialOrd for NodeByHostname {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for NodeByHostname {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.hostname.cmp(&other.0.hostname)
    }
}

/// The whole cluster: the set of nodes and their manifestations/applications.
///
/// Depending on who owns it, a `Deployment` is either the single authoritative
/// *desired* configuration (owned by the persistence service) or a synthesized
/// *observed* view (produced by the cluster-state service from agent
/// reports). Both are the same value type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub nodes: BTreeSet<NodeByHostname>,
}

impl Deployment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node(&self, hostname: &str) -> Option<&Node> {
        self.nodes.iter().map(|n| &n.0).find(|n| n.hostname == hostname)
    }

    /// Every primary `Manifestation` across every node, regardless of whether
    /// it is attached to an application.
    pub fn primary_manifestations(&self) -> Vec<Manifestation> {
        self.nodes
            .iter()
            .flat_map(|node| node.0.manifestations())
            .filter(|m| m.0.primary)
            .map(|m| m.0)
            .collect()
    }

    /// Returns any node in the Deployment whose manifestations contain a
    /// dataset id equal to `dataset_id` under ASCII case-insensitive
    /// comparison.
    pub fn dataset_id_collides(&self, dataset_id: &str) -> bool {
        let needle = dataset_id.to_ascii_lowercase();
        self.nodes.iter().any(|node| {
            node.0
                .manifestations()
                .iter()
                .any(|m| m.0.dataset.dataset_id.to_ascii_lowercase() == needle)
        })
    }

    /// Returns a new Deployment with a primary manifestation of `manifestation`
    /// added to the `other_manifestations` of the node named `hostname`,
    /// creating that node (with empty applications) if it is absent. Every
    /// other node is left untouched.
    pub fn with_primary_manifestation(&self, hostname: &str, manifestation: Manifestation) -> Self {
        let mut nodes: BTreeSet<NodeByHostname> = self
            .nodes
            .iter()
            .filter(|n| n.0.hostname != hostname)
            .cloned()
            .collect();
        let updated_node = match self.node(hostname) {
            Some(existing) => existing.with_other_manifestation(manifestation),
            None => {
                let mut node = Node::new(hostname);
                node.other_manifestations
                    .insert(ManifestationByDatasetId(manifestation));
                node
            }
        };
        nodes.insert(NodeByHostname(updated_node));
        Self { nodes }
    }

    /// Builds the `Deployment` view the cluster-state service synthesizes
    /// from the latest reported `NodeState` per hostname: each node's
    /// `other_manifestations` comes from the report directly, and its
    /// `applications` set is the union of `running` and `not_running`.
    pub fn from_node_states<'a>(states: impl IntoIterator<Item = &'a NodeState>) -> Self {
        let nodes = states
            .into_iter()
            .map(|state| {
                let applications: BTreeSet<ApplicationByName> = state
                    .running
                    .iter()
                    .chain(state.not_running.iter())
                    .cloned()
                    .map(ApplicationByName)
                    .collect();
                let other_manifestations: BTreeSet<ManifestationByDatasetId> = state
                    .other_manifestations
                    .iter()
                    .cloned()
                    .map(ManifestationByDatasetId)
                    .collect();
                NodeByHostname(Node {
                    hostname: state.hostname.clone(),
                    applications,
                    other_manifestations,
                })
            })
            .collect();
        Self { nodes }
    }
}
