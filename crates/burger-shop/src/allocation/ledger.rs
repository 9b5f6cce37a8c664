//! The ledger: produced/claimed counters, run state and the wake primitive.
//!
//! Every read and write goes through one `std::sync::Mutex`. Waiters park on a
//! `Notify` that is armed *before* the predicate is checked, so a wake that
//! lands between the check and the park is never lost. Every wake is a
//! broadcast; waiters always re-check under the lock.

use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use super::state::{ClaimOutcome, LedgerSnapshot, ProduceOutcome, RunState, Unit};

#[derive(Debug)]
struct LedgerState {
    produced: u64,
    claimed: u64,
    run_state: RunState,
}

/// Shared allocation state for one shop.
///
/// Share via `Arc<Ledger>`. Chefs call [`Ledger::try_produce`], sessions call
/// [`Ledger::claim`]; nothing else mutates the counters.
#[derive(Debug)]
pub struct Ledger {
    capacity: u64,
    state: Mutex<LedgerState>,
    changed: Notify,
    /// Upper bound on a single park before re-checking. `None` parks until woken.
    wake_timeout: Option<Duration>,
}

impl Ledger {
    pub fn new(capacity: u64) -> Self {
        // A zero-capacity shop has nothing to hand out; start drained so claims never park.
        let run_state = if capacity == 0 {
            RunState::Draining
        } else {
            RunState::Running
        };

        Self {
            capacity,
            state: Mutex::new(LedgerState {
                produced: 0,
                claimed: 0,
                run_state,
            }),
            changed: Notify::new(),
            wake_timeout: None,
        }
    }

    /// Bound each park so waiters re-check even if a wake were missed.
    pub fn with_wake_timeout(mut self, timeout: Duration) -> Self {
        self.wake_timeout = Some(timeout);
        self
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Lock the state, recovering from poison.
    ///
    /// Every mutation is a single step under the lock, so a panicking holder
    /// cannot leave the counters half-updated.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Ledger mutex poisoned - recovering state");
                poisoned.into_inner()
            }
        }
    }

    /// Produce one unit if the cap allows it. Never waits.
    pub fn try_produce(&self) -> ProduceOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.produced >= self.capacity {
                return ProduceOutcome::CapacityReached;
            }
            state.produced += 1;
            ProduceOutcome::Produced {
                unit: state.produced,
                remaining: self.capacity - state.produced,
            }
        };

        self.changed.notify_waiters();
        outcome
    }

    /// Claim the next unit, waiting until one is produced.
    ///
    /// Returns `Exhausted` once the ledger has left `Running`. Cancel-safe:
    /// the claim happens in the same poll that returns it, so dropping this
    /// future never loses a unit.
    pub async fn claim(&self) -> ClaimOutcome {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(outcome) = self.try_claim() {
                return outcome;
            }

            self.park(notified).await;
        }
    }

    /// One non-blocking claim attempt. `None` means a claim would have to wait.
    pub fn try_claim(&self) -> Option<ClaimOutcome> {
        let mut state = self.lock();

        if !state.run_state.is_running() {
            return Some(ClaimOutcome::Exhausted);
        }

        if state.claimed >= state.produced {
            return None;
        }

        state.claimed += 1;
        let unit = Unit::new(state.claimed);

        if state.claimed == self.capacity {
            state.run_state = RunState::Draining;
            drop(state);
            tracing::info!(
                capacity = self.capacity,
                "No more burgers to serve, accepting no more customers"
            );
            self.changed.notify_waiters();
        }

        Some(ClaimOutcome::Claimed(unit))
    }

    /// Wait until the ledger leaves `Running` and return the state it moved to.
    pub async fn closed(&self) -> RunState {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let state = self.state();
            if !state.is_running() {
                return state;
            }

            self.park(notified).await;
        }
    }

    /// Move to `Stopped` and release every waiter.
    ///
    /// Returns `false` if the ledger was already stopped.
    pub fn stop(&self) -> bool {
        let previous = {
            let mut state = self.lock();
            std::mem::replace(&mut state.run_state, RunState::Stopped)
        };

        if previous == RunState::Stopped {
            return false;
        }

        tracing::debug!(from = %previous, "Ledger stopped");
        self.changed.notify_waiters();
        true
    }

    pub fn state(&self) -> RunState {
        self.lock().run_state
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            capacity: self.capacity,
            produced: state.produced,
            claimed: state.claimed,
            state: state.run_state,
        }
    }

    async fn park(&self, notified: Pin<&mut Notified<'_>>) {
        match self.wake_timeout {
            Some(timeout) => {
                if tokio::time::timeout(timeout, notified).await.is_err() {
                    tracing::trace!(?timeout, "Wake timeout elapsed, re-checking ledger");
                }
            }
            None => notified.await,
        }
    }
}
