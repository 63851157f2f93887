//! The persistent, bidirectional control RPC used between the control
//! service and convergence agents.

pub mod client;
pub mod framed;
pub mod protocol;
pub mod server;

pub use client::{ConnectionObserver, ReconnectingClient, RpcClient};
pub use protocol::{Ack, ClusterStatusCommand, Command, Envelope, NodeStateCommand};
pub use server::ControlRpcServer;
