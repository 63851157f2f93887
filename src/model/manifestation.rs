use serde::{Deserialize, Serialize};

use super::dataset::Dataset;

/// A copy of a `Dataset` stored on a node; `primary` marks the authoritative
/// holder. A dataset may have many manifestations across the cluster but at
/// most one per node, and the desired configuration must contain exactly one
/// primary manifestation per dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Manifestation {
    pub dataset: Dataset,
    pub primary: bool,
}

impl Manifestation {
    pub fn primary_of(dataset: Dataset) -> Self {
        Self {
            dataset,
            primary: true,
        }
    }
}

/// Pairs a `Manifestation` with the application mount point it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachedVolume {
    pub manifestation: Manifestation,
    pub mount_point: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_of_sets_the_flag() {
        let manifestation = Manifestation::primary_of(Dataset::new("x"));
        assert!(manifestation.primary);
    }
}
