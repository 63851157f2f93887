//! The convergence-loop FSM: runs the discover/report/converge cycle driven
//! by a single-slot latch of the most recent `ClientStatusUpdate`.
//!
//! A `ClientStatusUpdate` arriving while the loop is `Stopped` starts a new
//! run. One arriving while a run is active replaces the latch without
//! interrupting the in-flight phase; the next iteration observes the new
//! values. A `STOP` arriving while active is recorded as pending and takes
//! effect only once the current iteration completes, unless a later
//! `ClientStatusUpdate` arrives first, which discards the pending stop and
//! keeps the loop running.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::agent::cluster_status_fsm::{ClientStatusUpdate, ConvergenceLoopHandle};
use crate::deployer::Deployer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Discovering,
    Reporting,
    Converging,
}

struct Inner {
    state: LoopState,
    latch: Option<ClientStatusUpdate>,
    pending_stop: bool,
}

pub struct ConvergenceLoopFsm {
    inner: Mutex<Inner>,
    deployer: Arc<dyn Deployer>,
    hostname: String,
}

impl ConvergenceLoopFsm {
    pub fn new(hostname: impl Into<String>, deployer: Arc<dyn Deployer>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: LoopState::Stopped,
                latch: None,
                pending_stop: false,
            }),
            deployer,
            hostname: hostname.into(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.inner.lock().state
    }

    async fn run_until_stopped(self: Arc<Self>) {
        loop {
            // Runs indefinitely while active; yield once per iteration so a
            // deployer with no real I/O can't starve the runtime.
            tokio::task::yield_now().await;

            let update = {
                let mut inner = self.inner.lock();
                inner.state = LoopState::Discovering;
                inner
                    .latch
                    .clone()
                    .expect("run_until_stopped only starts with a latched update")
            };

            let cancel = CancellationToken::new();
            match self.deployer.discover_local_state(&cancel).await {
                Ok(local_state) => {
                    self.inner.lock().state = LoopState::Reporting;
                    if let Err(err) = update.client.send_node_state(local_state.clone()).await {
                        log::warn!(
                            target: "convergence_loop",
                            "{}: failed to report node state: {}",
                            self.hostname,
                            err
                        );
                    }

                    self.inner.lock().state = LoopState::Converging;
                    let change = self.deployer.calculate_necessary_state_changes(
                        &local_state,
                        &update.configuration,
                        &update.state,
                    );
                    if let Err(err) = change.run(self.deployer.as_ref(), &cancel).await {
                        log::warn!(target: "convergence_loop", "{}: convergence step failed: {}", self.hostname, err);
                    }
                }
                Err(err) => {
                    log::warn!(target: "convergence_loop", "{}: local discovery failed: {}", self.hostname, err);
                }
            }

            let mut inner = self.inner.lock();
            if inner.pending_stop {
                inner.state = LoopState::Stopped;
                inner.pending_stop = false;
                return;
            }
        }
    }
}

impl ConvergenceLoopHandle for Arc<ConvergenceLoopFsm> {
    fn client_status_update(&self, update: ClientStatusUpdate) {
        let should_spawn = {
            let mut inner = self.inner.lock();
            inner.latch = Some(update);
            inner.pending_stop = false;
            if inner.state == LoopState::Stopped {
                inner.state = LoopState::Discovering;
                true
            } else {
                false
            }
        };
        if should_spawn {
            let me = self.clone();
            tokio::spawn(async move { me.run_until_stopped().await });
        }
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state != LoopState::Stopped {
            inner.pending_stop = true;
        }
    }
}
