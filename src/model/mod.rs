//! Immutable value types for the configuration and state graph: datasets,
//! manifestations, applications, nodes, and deployments.
//!
//! Every type here is a plain value struct with structural equality. There
//! are no `&mut self` mutators: "updating" a value means producing a new one
//! (`Deployment::with_primary_manifestation`, `Node::with_other_manifestation`,
//! ...) and handing it to whichever service owns that slot of state.

pub mod application;
pub mod dataset;
pub mod deployment;
pub mod manifestation;
pub mod node;
pub mod node_state;

pub use application::Application;
pub use dataset::Dataset;
pub use deployment::Deployment;
pub use manifestation::{AttachedVolume, Manifestation};
pub use node::Node;
pub use node_state::NodeState;
