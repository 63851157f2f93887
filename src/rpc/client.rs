//! The agent's side of the control RPC: a client handle used to report
//! state, and a reconnecting driver with exponential backoff that keeps
//! attempting to (re)connect for as long as the agent runs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::model::{Deployment, NodeState};

use super::framed::{EnvelopeSink, EnvelopeStream};
use super::protocol::{Command, Envelope, NodeStateCommand};

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A lightweight, cloneable handle to the write half of an established
/// connection. The cluster-status FSM remembers the most recently connected
/// client and the convergence loop uses it to send `NodeStateCommand`s.
#[derive(Clone)]
pub struct RpcClient {
    id: u64,
    sink: Arc<Mutex<EnvelopeSink>>,
}

impl PartialEq for RpcClient {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for RpcClient {}

impl RpcClient {
    pub async fn send_node_state(&self, node_state: NodeState) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.send(&Envelope::Command(Command::NodeState(NodeStateCommand { node_state })))
            .await
    }
}

/// The capability the reconnecting client drives: maps connection lifecycle
/// events onto the agent's cluster-status FSM.
pub trait ConnectionObserver: Send + Sync {
    fn connected(&self, client: RpcClient);
    fn disconnected(&self);
    fn cluster_updated(&self, configuration: Deployment, state: Deployment);
}

struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self { current: INITIAL_BACKOFF }
    }

    fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_BACKOFF);
        delay
    }
}

/// Maintains a connection to the control service, reconnecting with
/// exponential backoff (capped at [`MAX_BACKOFF`]) for as long as the agent
/// service is running.
pub struct ReconnectingClient {
    addr: SocketAddr,
    observer: Arc<dyn ConnectionObserver>,
    cancel: CancellationToken,
}

impl ReconnectingClient {
    pub fn new(addr: SocketAddr, observer: Arc<dyn ConnectionObserver>) -> Arc<Self> {
        Arc::new(Self {
            addr,
            observer,
            cancel: CancellationToken::new(),
        })
    }

    /// Spawns the reconnect loop as a background task.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Halts reconnection attempts and tears down any live connection.
    /// Reconnection never resumes after this is called.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    async fn run(self: Arc<Self>) {
        let mut backoff = Backoff::new();
        let mut next_client_id: u64 = 0;

        while !self.cancel.is_cancelled() {
            match tokio::net::TcpStream::connect(self.addr).await {
                Ok(socket) => {
                    log::info!(target: "rpc_client", "connected to control service at {}", self.addr);
                    backoff.reset();
                    next_client_id += 1;
                    self.run_connection(socket, next_client_id).await;
                    self.observer.disconnected();
                }
                Err(source) => {
                    let err = TransportError::Connect {
                        peer: self.addr.to_string(),
                        source,
                    };
                    log::warn!(target: "rpc_client", "{}", err);
                }
            }

            if self.cancel.is_cancelled() {
                return;
            }
            let delay = backoff.next_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => return,
            }
        }
    }

    /// Drives one connection until it drops or the client is stopped.
    async fn run_connection(&self, socket: tokio::net::TcpStream, client_id: u64) {
        let (sink, mut source) = EnvelopeStream::new(socket).into_split();
        let client = RpcClient {
            id: client_id,
            sink: Arc::new(Mutex::new(sink)),
        };
        self.observer.connected(client);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                incoming = source.recv() => match incoming {
                    Ok(Some(Envelope::Command(Command::ClusterStatus(command)))) => {
                        self.observer.cluster_updated(command.configuration, command.state);
                    }
                    Ok(Some(_)) => {
                        log::warn!(target: "rpc_client", "unexpected frame from control service, ignoring");
                    }
                    Ok(None) => {
                        log::info!(target: "rpc_client", "control service closed the connection");
                        return;
                    }
                    Err(err) => {
                        log::warn!(target: "rpc_client", "transport error from control service: {}", err);
                        return;
                    }
                },
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_the_cap() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
    }

    #[test]
    fn backoff_resets_to_initial() {
        let mut backoff = Backoff::new();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), INITIAL_BACKOFF);
    }

    #[test]
    fn backoff_never_exceeds_the_cap() {
        let mut backoff = Backoff::new();
        for _ in 0..20 {
            backoff.next_delay();
        }
        assert!(backoff.next_delay() <= MAX_BACKOFF);
    }
}
