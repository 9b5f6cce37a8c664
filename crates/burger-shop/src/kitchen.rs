//! Kitchen: the pool of chefs producing burgers against the shared cap.
//!
//! Each chef is an independent task. A chef never talks to customers and
//! never looks at the claim counter; it only asks the ledger to produce.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::allocation::{Ledger, ProduceOutcome};
use crate::pacing::Pacing;

/// What one chef did before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChefReport {
    pub chef: usize,
    pub produced: u64,
}

pub struct Kitchen {
    ledger: Arc<Ledger>,
    num_chefs: usize,
    pacing: Pacing,
}

impl Kitchen {
    pub fn new(ledger: Arc<Ledger>, num_chefs: usize, pacing: Pacing) -> Self {
        Self {
            ledger,
            num_chefs,
            pacing,
        }
    }

    /// Start every chef. Chefs stop on their own at capacity, or early when
    /// `shutdown` fires.
    pub fn spawn(self, shutdown: CancellationToken) -> KitchenHandle {
        let mut chefs = JoinSet::new();
        for chef in 1..=self.num_chefs {
            chefs.spawn(run_chef(
                chef,
                Arc::clone(&self.ledger),
                self.pacing.clone(),
                shutdown.clone(),
            ));
        }
        tracing::info!(chefs = self.num_chefs, "Kitchen open");
        KitchenHandle { chefs }
    }
}

pub struct KitchenHandle {
    chefs: JoinSet<ChefReport>,
}

impl KitchenHandle {
    /// Wait for every chef to stop. Reports are ordered by chef number.
    pub async fn join(mut self) -> Vec<ChefReport> {
        let mut reports = Vec::new();
        while let Some(result) = self.chefs.join_next().await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "Chef task failed"),
            }
        }
        reports.sort_by_key(|r| r.chef);
        reports
    }
}

async fn run_chef(
    chef: usize,
    ledger: Arc<Ledger>,
    pacing: Pacing,
    shutdown: CancellationToken,
) -> ChefReport {
    let mut produced = 0;

    loop {
        let prep_time = pacing.pick();

        match ledger.try_produce() {
            ProduceOutcome::CapacityReached => {
                tracing::debug!(chef, produced, "Capacity reached, chef done");
                break;
            }
            ProduceOutcome::Produced { unit, remaining } => {
                produced += 1;
                tracing::info!(
                    chef,
                    unit,
                    remaining,
                    prep_ms = prep_time.as_millis() as u64,
                    "Chef prepared burger"
                );
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!(chef, produced, "Kitchen closing, chef leaving early");
                break;
            }
            _ = tokio::time::sleep(prep_time) => {}
        }
    }

    ChefReport { chef, produced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn chefs_produce_exactly_capacity() {
        let ledger = Arc::new(Ledger::new(40));
        let handle = Kitchen::new(Arc::clone(&ledger), 5, Pacing::none())
            .spawn(CancellationToken::new());

        let reports = handle.join().await;

        assert_eq!(reports.len(), 5);
        assert_eq!(
            reports.iter().map(|r| r.chef).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(reports.iter().map(|r| r.produced).sum::<u64>(), 40);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.produced, 40);
        assert_eq!(snapshot.claimed, 0);
        assert_eq!(ledger.try_produce(), ProduceOutcome::CapacityReached);
    }

    #[tokio::test]
    async fn shutdown_stops_chefs_before_capacity() {
        let ledger = Arc::new(Ledger::new(1_000));
        let shutdown = CancellationToken::new();
        let pacing = Pacing::from_millis(&[50]).unwrap();
        let handle = Kitchen::new(Arc::clone(&ledger), 2, pacing).spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        let reports = handle.join().await;
        let produced: u64 = reports.iter().map(|r| r.produced).sum();
        assert!(produced >= 2 && produced < 1_000);
        assert_eq!(ledger.snapshot().produced, produced);
    }
}
