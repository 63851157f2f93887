//! The control service's side of the bidirectional RPC: accepts connections
//! from convergence agents, applies incoming `NodeStateCommand`s to the
//! cluster-state service, and pushes `ClusterStatusCommand`s to every
//! connected agent whenever the desired configuration or the observed state
//! changes.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::cluster_state::ClusterStateService;
use crate::persistence::PersistenceService;

use super::framed::EnvelopeStream;
use super::protocol::{Ack, ClusterStatusCommand, Command, Envelope};

type Outbound = mpsc::UnboundedSender<ClusterStatusCommand>;

/// Accepts agent connections and fans out `ClusterStatusCommand` pushes.
///
/// Each connected agent gets its own outbound queue so a push to one agent
/// can never be reordered by contention with another agent's connection; the
/// queue is drained by that connection's dedicated task in send order.
pub struct ControlRpcServer {
    persistence: Arc<PersistenceService>,
    cluster_state: Arc<ClusterStateService>,
    connections: Arc<parking_lot::RwLock<Vec<Outbound>>>,
}

impl ControlRpcServer {
    pub fn new(persistence: Arc<PersistenceService>, cluster_state: Arc<ClusterStateService>) -> Arc<Self> {
        let server = Arc::new(Self {
            persistence,
            cluster_state,
            connections: Arc::new(parking_lot::RwLock::new(Vec::new())),
        });

        let for_listener = server.clone();
        server
            .persistence
            .register_listener(Arc::new(move |_deployment| for_listener.broadcast_status()));

        server
    }

    /// Binds `addr` and serves connections until the returned task is
    /// aborted or the listener errors.
    pub async fn serve(self: Arc<Self>, addr: std::net::SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        log::info!(target: "rpc_server", "listening for agents on {}", addr);
        loop {
            let (socket, peer) = listener.accept().await?;
            log::info!(target: "rpc_server", "agent connected from {}", peer);
            let server = self.clone();
            tokio::spawn(async move {
                server.handle_connection(socket).await;
            });
        }
    }

    async fn handle_connection(self: Arc<Self>, socket: tokio::net::TcpStream) {
        let mut stream = EnvelopeStream::new(socket);
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClusterStatusCommand>();
        self.connections.write().push(outbound_tx);

        // Send the current status immediately so a freshly connected agent
        // doesn't wait for the next save/update_node_state to learn it.
        let initial = self.current_status();
        if stream
            .send(&Envelope::Command(Command::ClusterStatus(initial)))
            .await
            .is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                incoming = stream.recv() => {
                    match incoming {
                        Ok(Some(Envelope::Command(Command::NodeState(command)))) => {
                            self.cluster_state.update_node_state(command.node_state);
                            self.broadcast_status();
                            if stream.send(&Envelope::Ack(Ack)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Some(_)) => {
                            log::warn!(target: "rpc_server", "unexpected frame from agent, ignoring");
                        }
                        Ok(None) => {
                            log::info!(target: "rpc_server", "agent disconnected");
                            break;
                        }
                        Err(err) => {
                            log::warn!(target: "rpc_server", "transport error from agent: {}", err);
                            break;
                        }
                    }
                }
                Some(status) = outbound_rx.recv() => {
                    if stream.send(&Envelope::Command(Command::ClusterStatus(status))).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn current_status(&self) -> ClusterStatusCommand {
        ClusterStatusCommand {
            configuration: self.persistence.get(),
            state: self.cluster_state.as_deployment(),
        }
    }

    /// Pushes the current status to every connected agent. Called after
    /// every successful `save` and every `update_node_state`.
    fn broadcast_status(&self) {
        let status = self.current_status();
        let mut dead = Vec::new();
        {
            let connections = self.connections.read();
            for (index, sender) in connections.iter().enumerate() {
                if sender.send(status.clone()).is_err() {
                    dead.push(index);
                }
            }
        }
        if !dead.is_empty() {
            let mut connections = self.connections.write();
            for index in dead.into_iter().rev() {
                connections.swap_remove(index);
            }
        }
    }
}
