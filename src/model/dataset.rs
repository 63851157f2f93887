use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A logical data volume, identified cluster-wide by `dataset_id`.
///
/// Equality and hashing are case-sensitive; uniqueness across a `Deployment`
/// is a separate, case-insensitive invariant enforced where datasets are
/// created (see `crate::api::v1::datasets`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<u64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Dataset {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            maximum_size: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_maximum_size(mut self, maximum_size: Option<u64>) -> Self {
        self.maximum_size = maximum_size;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}
