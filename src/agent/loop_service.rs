//! Top-level agent process composition: wires a [`ReconnectingClient`] to the
//! cluster-status FSM, which drives the convergence-loop FSM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::agent::cluster_status_fsm::ClusterStatusFsm;
use crate::agent::convergence_loop_fsm::ConvergenceLoopFsm;
use crate::deployer::Deployer;
use crate::model::Deployment;
use crate::rpc::{ConnectionObserver, ReconnectingClient, RpcClient};

impl ConnectionObserver for ClusterStatusFsm {
    fn connected(&self, client: RpcClient) {
        ClusterStatusFsm::connected(self, client);
    }

    fn disconnected(&self) {
        ClusterStatusFsm::disconnected(self);
    }

    fn cluster_updated(&self, configuration: Deployment, state: Deployment) {
        self.status_update(configuration, state);
    }
}

/// Owns the full agent side of the convergence machinery for one node:
/// maintains the RPC connection to the control service and runs discovered
/// state through the attached [`Deployer`] on every authoritative update.
pub struct AgentLoopService {
    client: Arc<ReconnectingClient>,
    cluster_status: Arc<ClusterStatusFsm>,
}

impl AgentLoopService {
    /// Builds the service without starting it. `hostname` identifies this
    /// node's reported state; `deployer` performs discovery and convergence.
    pub fn new(hostname: impl Into<String>, control_addr: SocketAddr, deployer: Arc<dyn Deployer>) -> Arc<Self> {
        let convergence_loop = ConvergenceLoopFsm::new(hostname, deployer);
        let cluster_status = Arc::new(ClusterStatusFsm::new(Box::new(convergence_loop)));
        let client = ReconnectingClient::new(control_addr, cluster_status.clone());
        Arc::new(Self { client, cluster_status })
    }

    /// Starts the reconnect loop in the background. Connection attempts
    /// continue, with exponential backoff, until [`Self::stop`] is called.
    pub fn start(&self) {
        self.client.clone().spawn();
    }

    /// Halts reconnection attempts and tears down any live connection. There
    /// is no resuming after this; build a new service to reconnect. Also
    /// shuts down the cluster-status FSM, which stops the convergence loop
    /// once its current iteration (if any) completes.
    pub fn stop(&self) {
        self.client.stop();
        self.cluster_status.shutdown();
    }

    /// Used by the incoming side of the bidirectional RPC, independent of
    /// this agent's own `ReconnectingClient` (e.g. in tests driving the FSM
    /// directly without a real socket).
    pub fn connected(&self, client: RpcClient) {
        self.cluster_status.connected(client);
    }

    pub fn disconnected(&self) {
        self.cluster_status.disconnected();
    }

    pub fn cluster_updated(&self, configuration: Deployment, state: Deployment) {
        self.cluster_status.status_update(configuration, state);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::agent::cluster_status_fsm::ClusterStatusFsm;
    use crate::agent::convergence_loop_fsm::LoopState;
    use crate::deployer::fixtures::{FixtureDeployer, RecordedCall};
    use crate::model::NodeState;
    use crate::rpc::client::testing::fake_client_async;

    #[tokio::test]
    async fn start_and_stop_do_not_panic_without_a_reachable_control_service() {
        let (deployer, _log) = FixtureDeployer::new(NodeState::new("host-a"));
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let service = AgentLoopService::new("host-a", addr, Arc::new(deployer));
        service.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        service.stop();
    }

    /// Connect, then a status push forwards to the convergence loop and
    /// discovery begins.
    #[tokio::test]
    async fn status_push_after_connect_starts_discovery() {
        let (deployer, log) = FixtureDeployer::new(NodeState::new("host-a"));
        let convergence_loop = crate::agent::convergence_loop_fsm::ConvergenceLoopFsm::new("host-a", Arc::new(deployer));
        let cluster_status = Arc::new(ClusterStatusFsm::new(Box::new(convergence_loop.clone())));

        cluster_status.connected(fake_client_async(1).await);
        cluster_status.status_update(Deployment::empty(), Deployment::empty());
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(log.calls.lock().iter().any(|call| *call == RecordedCall::Discover));
        assert_ne!(convergence_loop.state(), LoopState::Stopped);

        cluster_status.shutdown();
    }

    /// Connect, status, disconnect (convergence loop stops after its
    /// current iteration), reconnect, status again, and new iterations run
    /// using the new client.
    #[tokio::test]
    async fn reconnect_resumes_the_convergence_loop_with_the_new_client() {
        let (deployer, log) = FixtureDeployer::new(NodeState::new("host-a"));
        let convergence_loop = crate::agent::convergence_loop_fsm::ConvergenceLoopFsm::new("host-a", Arc::new(deployer));
        let cluster_status = Arc::new(ClusterStatusFsm::new(Box::new(convergence_loop.clone())));

        cluster_status.connected(fake_client_async(1).await);
        cluster_status.status_update(Deployment::empty(), Deployment::empty());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_ne!(convergence_loop.state(), LoopState::Stopped);

        cluster_status.disconnected();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(convergence_loop.state(), LoopState::Stopped);

        let calls_before_reconnect = log.calls.lock().len();

        cluster_status.connected(fake_client_async(2).await);
        cluster_status.status_update(Deployment::empty(), Deployment::empty());
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(log.calls.lock().len() > calls_before_reconnect);
        assert_ne!(convergence_loop.state(), LoopState::Stopped);

        cluster_status.shutdown();
    }
}
