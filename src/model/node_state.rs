use serde::{Deserialize, Serialize};

use super::application::Application;
use super::manifestation::Manifestation;

/// A point-in-time observation reported by a node's convergence agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub hostname: String,
    #[serde(default)]
    pub running: Vec<Application>,
    #[serde(default)]
    pub not_running: Vec<Application>,
    #[serde(default)]
    pub other_manifestations: Vec<Manifestation>,
}

impl NodeState {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            running: Vec::new(),
            not_running: Vec::new(),
            other_manifestations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_no_applications() {
        let state = NodeState::new("host-a");
        assert!(state.running.is_empty());
        assert!(state.not_running.is_empty());
    }
}
