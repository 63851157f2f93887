use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::application::Application;
use super::manifestation::Manifestation;

/// A host in the cluster.
///
/// `hostname` is unique within a `Deployment`. `applications` and
/// `other_manifestations` are serialized as sorted arrays (by `name` /
/// `dataset_id` respectively) so two structurally-equal nodes always encode
/// identically, which the control RPC wire format depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub hostname: String,
    #[serde(default)]
    pub applications: BTreeSet<ApplicationByName>,
    #[serde(default)]
    pub other_manifestations: BTreeSet<ManifestationByDatasetId>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.hostname == other.hostname
            && self.applications == other.applications
            && self.other_manifestations == other.other_manifestations
    }
}
impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hostname.hash(state);
    }
}

/// Wrapper giving `Application` a total, stable order by `name` for use in a
/// `BTreeSet`, matching the deterministic-encoding requirement on the wire
/// format (sets round-trip as arrays sorted by a stable key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationByName(pub Application);

impl PartialOrd for ApplicationByName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ApplicationByName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.name.cmp(&other.0.name)
    }
}

/// Wrapper giving `Manifestation` a total, stable order by `dataset_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestationByDatasetId(pub Manifestation);

impl PartialOrd for ManifestationByDatasetId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ManifestationByDatasetId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.dataset.dataset_id.cmp(&other.0.dataset.dataset_id)
    }
}

impl Node {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            applications: BTreeSet::new(),
            other_manifestations: BTreeSet::new(),
        }
    }

    /// Union of `other_manifestations` and the manifestations reachable via
    /// `applications[*].volume`.
    pub fn manifestations(&self) -> BTreeSet<ManifestationByDatasetId> {
        let mut all = self.other_manifestations.clone();
        for app in &self.applications {
            if let Some(volume) = &app.0.volume {
                all.insert(ManifestationByDatasetId(volume.manifestation.clone()));
            }
        }
        all
    }

    /// Returns a copy of this node with `manifestation` added to
    /// `other_manifestations`.
    pub fn with_other_manifestation(&self, manifestation: Manifestation) -> Self {
        let mut other_manifestations = self.other_manifestations.clone();
        other_manifestations.insert(ManifestationByDatasetId(manifestation));
        Self {
            hostname: self.hostname.clone(),
            applications: self.applications.clone(),
            other_manifestations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dataset::Dataset;

    #[test]
    fn manifestations_combines_attached_and_unattached() {
        let mut node = Node::new("host-a");
        node.other_manifestations.insert(ManifestationByDatasetId(
            Manifestation::primary_of(Dataset::new("x")),
        ));
        assert_eq!(node.manifestations().len(), 1);
    }

    #[test]
    fn with_other_manifestation_leaves_applications_untouched() {
        let node = Node::new("host-a");
        let updated = node.with_other_manifestation(Manifestation::primary_of(Dataset::new("y")));
        assert_eq!(updated.applications, node.applications);
        assert_eq!(updated.other_manifestations.len(), 1);
    }
}
