//! Simulated work delays.
//!
//! Chefs take a while to prepare a burger and sessions take a while to hand
//! one over. The exact durations carry no correctness weight; each delay is
//! drawn uniformly from a small fixed set.

use std::str::FromStr;
use std::time::Duration;

use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacingError {
    #[error("pacing needs at least one delay")]
    Empty,
    #[error("invalid delay {value:?}: expected milliseconds")]
    InvalidDelay { value: String },
}

/// A set of delays to pick from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    choices: Vec<Duration>,
}

impl Pacing {
    pub fn new(choices: Vec<Duration>) -> Result<Self, PacingError> {
        if choices.is_empty() {
            return Err(PacingError::Empty);
        }
        Ok(Self { choices })
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self {
            choices: vec![Duration::ZERO],
        }
    }

    /// Chef preparation time: 2s or 4s.
    pub fn preparation() -> Self {
        Self {
            choices: vec![Duration::from_secs(2), Duration::from_secs(4)],
        }
    }

    /// Time to finish a burger: 1s, 3s or 5s.
    pub fn consumption() -> Self {
        Self {
            choices: vec![
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(5),
            ],
        }
    }

    pub fn from_secs(secs: &[u64]) -> Result<Self, PacingError> {
        Self::new(secs.iter().copied().map(Duration::from_secs).collect())
    }

    pub fn from_millis(millis: &[u64]) -> Result<Self, PacingError> {
        Self::new(millis.iter().copied().map(Duration::from_millis).collect())
    }

    pub fn choices(&self) -> &[Duration] {
        &self.choices
    }

    pub fn is_instant(&self) -> bool {
        self.choices.iter().all(Duration::is_zero)
    }

    /// Draw one delay.
    pub fn pick(&self) -> Duration {
        self.choices
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Parses a comma separated list of milliseconds, e.g. `"2000,4000"`.
impl FromStr for Pacing {
    type Err = PacingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let millis = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u64>().map_err(|_| PacingError::InvalidDelay {
                    value: part.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_millis(&millis)
    }
}

impl std::fmt::Display for Pacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .choices
            .iter()
            .map(|d| d.as_millis().to_string())
            .collect();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_stays_within_choices() {
        let pacing = Pacing::from_secs(&[1, 3, 5]).unwrap();
        for _ in 0..50 {
            assert!(pacing.choices().contains(&pacing.pick()));
        }
    }

    #[test]
    fn none_is_instant() {
        let pacing = Pacing::none();
        assert!(pacing.is_instant());
        assert_eq!(pacing.pick(), Duration::ZERO);
    }

    #[test]
    fn empty_pacing_is_rejected() {
        assert_eq!(Pacing::new(vec![]), Err(PacingError::Empty));
        assert_eq!("".parse::<Pacing>(), Err(PacingError::Empty));
    }

    #[test]
    fn parses_millisecond_list() {
        let pacing: Pacing = " 2000, 4000 ".parse().unwrap();
        assert_eq!(
            pacing.choices(),
            &[Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(pacing.to_string(), "2000,4000");
    }

    #[test]
    fn rejects_non_numeric_delay() {
        assert_eq!(
            "10,soon".parse::<Pacing>(),
            Err(PacingError::InvalidDelay {
                value: "soon".to_string()
            })
        );
    }
}
