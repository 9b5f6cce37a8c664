//! Session supervisor - admits customers and sees every session to its end.
//!
//! Owns the accept loop only; it never touches the ledger's counters. Live
//! sessions are tracked in a DashMap so they can be inspected without
//! blocking the accept loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::allocation::{Ledger, Unit};
use crate::bridge::protocol::SessionId;
use crate::session::{ConsumerSession, SessionConfig, SessionEnd, SessionReport};

/// A connected customer.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub peer: SocketAddr,
    pub connected_at: Instant,
}

impl SessionInfo {
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SupervisorReport {
    pub sessions: Vec<SessionReport>,
    /// Session tasks that panicked; their reports are lost.
    pub panicked: usize,
}

impl SupervisorReport {
    /// Every unit confirmed delivered, in unit order.
    pub fn delivered(&self) -> Vec<Unit> {
        let mut units: Vec<Unit> = self
            .sessions
            .iter()
            .flat_map(|s| s.served.iter().copied())
            .collect();
        units.sort_unstable();
        units
    }

    pub fn failed(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.end == SessionEnd::Failed)
            .count()
    }

    fn record(&mut self, joined: Result<SessionReport, JoinError>) {
        match joined {
            Ok(session) => self.sessions.push(session),
            Err(e) => {
                tracing::error!(error = %e, "Session task failed");
                self.panicked += 1;
            }
        }
    }
}

/// Removes a session from the registry when its task ends, however it ends.
struct Registration {
    id: SessionId,
    supervisor: Arc<SessionSupervisor>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some((id, info)) = self.supervisor.sessions.remove(&self.id) {
            tracing::debug!(
                session = %id,
                peer = %info.peer,
                connected_ms = info.connected_for().as_millis() as u64,
                "Customer left"
            );
        }
    }
}

pub struct SessionSupervisor {
    ledger: Arc<Ledger>,
    config: SessionConfig,
    sessions: DashMap<SessionId, SessionInfo>,
}

impl SessionSupervisor {
    pub fn new(ledger: Arc<Ledger>, config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            config,
            sessions: DashMap::new(),
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Accept customers until every session has ended after sell-out, or
    /// `shutdown` fires. Then mark the ledger stopped and collect the reports.
    ///
    /// While the ledger is draining, customers are still admitted and their
    /// sessions answer `SOLD_OUT` straight away. Admission ends only when the
    /// ledger is `Stopped`.
    pub async fn run(
        self: &Arc<Self>,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> SupervisorReport {
        let mut tasks = JoinSet::new();
        let mut report = SupervisorReport::default();
        let mut sold_out = false;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, turning customers away");
                    break;
                }
                Some(joined) = tasks.join_next() => {
                    report.record(joined);
                    if sold_out && tasks.is_empty() {
                        break;
                    }
                }
                state = self.ledger.closed(), if !sold_out => {
                    tracing::info!(%state, sessions = tasks.len(), "Sold out, new customers get SOLD_OUT");
                    sold_out = true;
                    if tasks.is_empty() {
                        break;
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.admit(&mut tasks, stream, peer),
                    Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
                },
            }
        }

        self.ledger.stop();
        drop(listener);
        tracing::debug!(remaining = tasks.len(), "Waiting for sessions to finish");

        while let Some(joined) = tasks.join_next().await {
            report.record(joined);
        }

        let snapshot = self.ledger.snapshot();
        tracing::info!(
            sessions = report.sessions.len(),
            failed = report.failed(),
            produced = snapshot.produced,
            claimed = snapshot.claimed,
            in_stock = snapshot.in_stock(),
            "No more burgers, shop closed"
        );
        report
    }

    fn admit(
        self: &Arc<Self>,
        tasks: &mut JoinSet<SessionReport>,
        stream: TcpStream,
        peer: SocketAddr,
    ) {
        let id = SessionId::new();
        self.sessions.insert(
            id,
            SessionInfo {
                peer,
                connected_at: Instant::now(),
            },
        );
        tracing::info!(session = %id, %peer, "Customer connected");

        let registration = Registration {
            id,
            supervisor: Arc::clone(self),
        };
        let session = ConsumerSession::new(id, Arc::clone(&self.ledger), self.config.clone(), stream);
        tasks.spawn(async move {
            let _registration = registration;
            session.run().await
        });
    }
}
