//! The convergence agent that runs on each node: maintains the RPC
//! connection to the control service and drives local state toward the
//! desired configuration.

pub mod cluster_status_fsm;
pub mod convergence_loop_fsm;
pub mod loop_service;

pub use cluster_status_fsm::{ClientStatusUpdate, ClusterStatusFsm, ConvergenceLoopHandle};
pub use convergence_loop_fsm::{ConvergenceLoopFsm, LoopState};
pub use loop_service::AgentLoopService;
