//! The cluster-status FSM: tracks the RPC connection and the latest
//! authoritative snapshot pushed by the control service, and forwards
//! `ClientStatusUpdate`/`STOP` inputs to the convergence-loop FSM.
//!
//! States: `Disconnected` (initial) -> `ConnectedNoStatus` -> `ConnectedWithStatus`,
//! with `Shutdown` as a terminal absorbing state.

use parking_lot::Mutex;

use crate::model::Deployment;
use crate::rpc::RpcClient;

/// The payload handed to the convergence loop: the client to report through
/// plus the authoritative configuration and observed state to converge
/// toward.
#[derive(Clone, PartialEq)]
pub struct ClientStatusUpdate {
    pub client: RpcClient,
    pub configuration: Deployment,
    pub state: Deployment,
}

/// The capability the cluster-status FSM drives. Implemented by the real
/// convergence-loop FSM, and by a recording stub in tests so transition
/// behavior can be asserted without running real iterations.
pub trait ConvergenceLoopHandle: Send + Sync {
    fn client_status_update(&self, update: ClientStatusUpdate);
    fn stop(&self);
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Disconnected,
    ConnectedNoStatus { client: RpcClient },
    ConnectedWithStatus { client: RpcClient },
    Shutdown,
}

// RpcClient doesn't implement Debug; keep State's Debug readable without it.
impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcClient")
    }
}

pub struct ClusterStatusFsm {
    state: Mutex<State>,
    convergence_loop: Box<dyn ConvergenceLoopHandle>,
}

impl ClusterStatusFsm {
    pub fn new(convergence_loop: Box<dyn ConvergenceLoopHandle>) -> Self {
        Self {
            state: Mutex::new(State::Disconnected),
            convergence_loop,
        }
    }

    pub fn connected(&self, client: RpcClient) {
        let mut state = self.state.lock();
        if matches!(*state, State::Disconnected) {
            *state = State::ConnectedNoStatus { client };
        }
    }

    pub fn status_update(&self, configuration: Deployment, state: Deployment) {
        let mut guard = self.state.lock();
        let client = match &*guard {
            State::ConnectedNoStatus { client } | State::ConnectedWithStatus { client } => client.clone(),
            State::Disconnected | State::Shutdown => return,
        };
        *guard = State::ConnectedWithStatus { client: client.clone() };
        drop(guard);
        self.convergence_loop.client_status_update(ClientStatusUpdate {
            client,
            configuration,
            state,
        });
    }

    pub fn disconnected(&self) {
        let mut guard = self.state.lock();
        let had_status = matches!(*guard, State::ConnectedWithStatus { .. });
        match *guard {
            State::ConnectedNoStatus { .. } | State::ConnectedWithStatus { .. } => {
                *guard = State::Disconnected;
            }
            State::Disconnected | State::Shutdown => {}
        }
        drop(guard);
        if had_status {
            self.convergence_loop.stop();
        }
    }

    pub fn shutdown(&self) {
        let mut guard = self.state.lock();
        let had_status = matches!(*guard, State::ConnectedWithStatus { .. });
        let is_shutdown_already = matches!(*guard, State::Shutdown);
        *guard = State::Shutdown;
        drop(guard);
        if is_shutdown_already {
            return;
        }
        if had_status {
            self.convergence_loop.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Recorded {
        StatusUpdate(Deployment, Deployment),
        Stop,
    }

    #[derive(Default)]
    struct StubConvergenceLoop {
        inputs: StdMutex<Vec<Recorded>>,
    }

    impl StubConvergenceLoop {
        fn inputs(&self) -> Vec<Recorded> {
            self.inputs.lock().unwrap().clone()
        }
    }

    impl ConvergenceLoopHandle for std::sync::Arc<StubConvergenceLoop> {
        fn client_status_update(&self, update: ClientStatusUpdate) {
            self.inputs
                .lock()
                .unwrap()
                .push(Recorded::StatusUpdate(update.configuration, update.state));
        }
        fn stop(&self) {
            self.inputs.lock().unwrap().push(Recorded::Stop);
        }
    }

    fn fake_client(id: u64) -> RpcClient {
        crate::rpc::client::testing::fake_client(id)
    }

    fn fsm() -> (ClusterStatusFsm, std::sync::Arc<StubConvergenceLoop>) {
        let stub = std::sync::Arc::new(StubConvergenceLoop::default());
        (ClusterStatusFsm::new(Box::new(stub.clone())), stub)
    }

    #[test]
    fn creation_has_no_side_effects() {
        let (_fsm, stub) = fsm();
        assert_eq!(stub.inputs(), vec![]);
    }

    #[test]
    fn first_status_update_is_forwarded() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        assert_eq!(
            stub.inputs(),
            vec![Recorded::StatusUpdate(Deployment::empty(), Deployment::empty())]
        );
    }

    #[test]
    fn second_status_update_is_also_forwarded() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        fsm.status_update(Deployment::empty(), Deployment::empty());
        assert_eq!(stub.inputs().len(), 2);
    }

    #[test]
    fn disconnect_before_status_update_notifies_nothing() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.disconnected();
        assert_eq!(stub.inputs(), vec![]);
    }

    #[test]
    fn disconnect_after_status_update_sends_stop() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        fsm.disconnected();
        assert_eq!(stub.inputs().last(), Some(&Recorded::Stop));
    }

    #[test]
    fn reconnect_after_disconnect_resumes_normally() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        fsm.disconnected();
        fsm.connected(fake_client(2));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        assert_eq!(
            stub.inputs(),
            vec![
                Recorded::StatusUpdate(Deployment::empty(), Deployment::empty()),
                Recorded::Stop,
                Recorded::StatusUpdate(Deployment::empty(), Deployment::empty()),
            ]
        );
    }

    #[test]
    fn shutdown_before_connect_does_nothing() {
        let (fsm, stub) = fsm();
        fsm.shutdown();
        assert_eq!(stub.inputs(), vec![]);
    }

    #[test]
    fn shutdown_after_connect_without_status_does_not_notify() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.shutdown();
        assert_eq!(stub.inputs(), vec![]);
    }

    #[test]
    fn shutdown_after_status_update_sends_stop() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        fsm.shutdown();
        assert_eq!(stub.inputs().last(), Some(&Recorded::Stop));
    }

    #[test]
    fn shutdown_fsm_ignores_further_inputs() {
        let (fsm, stub) = fsm();
        fsm.connected(fake_client(1));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        fsm.shutdown();
        let before = stub.inputs();
        fsm.disconnected();
        fsm.connected(fake_client(2));
        fsm.status_update(Deployment::empty(), Deployment::empty());
        assert_eq!(stub.inputs(), before);
    }
}
