//! Wire-level command envelopes for the control RPC.
//!
//! Each frame is the canonical JSON encoding of one `Command`, length-delimited
//! by the transport (see `rpc::framed`). Every command gets an `Ack` in reply;
//! no acknowledgement is required beyond that at this layer.

use serde::{Deserialize, Serialize};

use crate::model::{Deployment, NodeState};

/// agent → control: report locally observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStateCommand {
    pub node_state: NodeState,
}

/// control → agent: push the authoritative desired configuration together
/// with the latest aggregated observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatusCommand {
    pub configuration: Deployment,
    pub state: Deployment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Command {
    NodeState(NodeStateCommand),
    ClusterStatus(ClusterStatusCommand),
}

/// The only reply a `Command` ever gets: an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Envelope {
    Command(Command),
    Ack(Ack),
}
