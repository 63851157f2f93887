use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::manifestation::AttachedVolume;

/// A runnable unit on a node.
///
/// `name` is unique within a node. `extra` captures fields the core does not
/// interpret (ports, links, environment, ...) so they round-trip through
/// decode/encode unchanged rather than being silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<AttachedVolume>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Eq for Application {}

impl std::hash::Hash for Application {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Applications are keyed by name within a node; the opaque `extra`
        // map is not hashable in general (serde_json::Value has no Hash
        // impl) so identity for set membership is name + image + volume.
        self.name.hash(state);
        self.image.hash(state);
        self.volume.hash(state);
    }
}

impl Application {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            volume: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_volume(mut self, volume: Option<AttachedVolume>) -> Self {
        self.volume = volume;
        self
    }
}
