//! Value types exchanged with the ledger.

use serde::{Deserialize, Serialize};

/// Lifecycle of the shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Units may still be produced and claimed.
    #[default]
    Running,
    /// Every unit has been claimed; sessions are finishing.
    Draining,
    /// No sessions remain and no connections are accepted.
    Stopped,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One claimed unit, numbered from 1 in claim order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(u64);

impl Unit {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProduceOutcome {
    /// `unit` is the new production count; `remaining` is how many more may be made.
    Produced { unit: u64, remaining: u64 },
    CapacityReached,
}

impl ProduceOutcome {
    pub fn is_produced(&self) -> bool {
        matches!(self, Self::Produced { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(Unit),
    /// No further units will ever become claimable.
    Exhausted,
}

impl ClaimOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Consistent view of the ledger, taken under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub capacity: u64,
    pub produced: u64,
    pub claimed: u64,
    pub state: RunState,
}

impl LedgerSnapshot {
    /// Produced but not yet claimed.
    pub fn in_stock(&self) -> u64 {
        self.produced - self.claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(RunState::Running.is_running());
        assert!(!RunState::Draining.is_running());
    }

    #[test]
    fn run_state_serializes_screaming_snake_case() {
        insta::assert_json_snapshot!(
            [RunState::Running, RunState::Draining, RunState::Stopped],
            @r#"
        [
          "RUNNING",
          "DRAINING",
          "STOPPED"
        ]
        "#
        );
    }

    #[test]
    fn run_state_deserializes_screaming_snake_case() {
        assert_eq!(
            serde_json::from_str::<RunState>("\"DRAINING\"").unwrap(),
            RunState::Draining
        );
    }

    #[test]
    fn snapshot_serializes_flat() {
        let snapshot = LedgerSnapshot {
            capacity: 5,
            produced: 4,
            claimed: 2,
            state: RunState::Running,
        };
        assert_eq!(snapshot.in_stock(), 2);
        insta::assert_json_snapshot!(snapshot, @r#"
        {
          "capacity": 5,
          "produced": 4,
          "claimed": 2,
          "state": "RUNNING"
        }
        "#);
    }

    #[test]
    fn unit_displays_with_hash() {
        assert_eq!(Unit::new(7).to_string(), "#7");
    }
}
