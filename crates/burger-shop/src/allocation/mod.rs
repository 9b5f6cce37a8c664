//! Allocation core: the single place shared shop state lives.
//!
//! All counters and the run state sit behind one mutex, paired with one wake
//! primitive. Claims are handed out as the gapless sequence `1..=capacity`:
//! - `Running` → `Draining` when the last unit is claimed (exactly once)
//! - `Draining` → `Stopped` once the supervisor has seen every session exit
//! - `Running` → `Stopped` on external shutdown
//! - `Stopped` is terminal

mod ledger;
mod state;

pub use ledger::Ledger;
pub use state::{ClaimOutcome, LedgerSnapshot, ProduceOutcome, RunState, Unit};
