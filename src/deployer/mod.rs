//! The abstraction the convergence loop uses to discover local state and
//! converge toward desired configuration. The container runtime and volume
//! backend that a production `Deployer` would talk to are out of scope here;
//! this module defines only the seam and a fixture used by the FSM tests.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DeployerError;
use crate::model::{Deployment, NodeState};

/// A capability, produced by `Deployer::calculate_necessary_state_changes`,
/// that applies one convergence step. Running it twice in succession with no
/// external changes must be a no-op on the second invocation.
#[async_trait]
pub trait StateChange: Send + Sync + std::fmt::Debug {
    async fn run(&self, deployer: &dyn Deployer, cancel: &CancellationToken) -> Result<(), DeployerError>;
}

/// Node-local actor that discovers observed state and computes/applies the
/// changes needed to converge toward desired configuration.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Produces the node's current observed state. Callers must not invoke
    /// this again until the previous call completes.
    async fn discover_local_state(&self, cancel: &CancellationToken) -> Result<NodeState, DeployerError>;

    /// A pure function over values: computes what would need to change to
    /// bring `local` into alignment with `desired`, given the rest of the
    /// cluster's `observed` state.
    fn calculate_necessary_state_changes(
        &self,
        local: &NodeState,
        desired: &Deployment,
        observed: &Deployment,
    ) -> Box<dyn StateChange>;
}

/// A no-op `StateChange`, used when a deployer determines there is nothing to
/// converge.
#[derive(Debug)]
pub struct NoOp;

#[async_trait]
impl StateChange for NoOp {
    async fn run(&self, _deployer: &dyn Deployer, _cancel: &CancellationToken) -> Result<(), DeployerError> {
        Ok(())
    }
}
