//! Shop configuration, fixed at startup.

use std::time::Duration;

use crate::pacing::Pacing;
use crate::session::SessionConfig;

pub const DEFAULT_CAPACITY: u64 = 25;
pub const DEFAULT_NUM_PRODUCERS: usize = 2;
pub const DEFAULT_REQUEST_QUOTA: u32 = 10;
pub const DEFAULT_WAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Startup faults. Fatal before the shop opens, never raised afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("capacity must be positive")]
    ZeroCapacity,
    #[error("at least one chef is required")]
    ZeroProducers,
    #[error("request quota must be positive")]
    ZeroQuota,
    #[error("wake timeout must be positive")]
    ZeroWakeTimeout,
}

#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Total burgers the shop will ever make.
    pub capacity: u64,
    pub num_producers: usize,
    /// Burgers a single connection may receive.
    pub request_quota: u32,
    /// Delay a chef takes between burgers.
    pub prep_pacing: Pacing,
    /// Delay a session takes after serving, before reading the next order.
    pub consume_pacing: Pacing,
    /// Liveness bound on a single wait inside the ledger.
    pub wake_timeout: Option<Duration>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            num_producers: DEFAULT_NUM_PRODUCERS,
            request_quota: DEFAULT_REQUEST_QUOTA,
            prep_pacing: Pacing::preparation(),
            consume_pacing: Pacing::consumption(),
            wake_timeout: Some(DEFAULT_WAKE_TIMEOUT),
        }
    }
}

impl ShopConfig {
    /// No simulated delays; useful for tests and benchmarks.
    pub fn instant(capacity: u64, num_producers: usize) -> Self {
        Self {
            capacity,
            num_producers,
            prep_pacing: Pacing::none(),
            consume_pacing: Pacing::none(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.num_producers == 0 {
            return Err(ConfigError::ZeroProducers);
        }
        if self.request_quota == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        if self.wake_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroWakeTimeout);
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            request_quota: self.request_quota,
            pacing: self.consume_pacing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_small_lunch_rush() {
        let config = ShopConfig::default();
        assert_eq!(config.capacity, 25);
        assert_eq!(config.num_producers, 2);
        assert_eq!(config.request_quota, 10);
        assert_eq!(config.prep_pacing.to_string(), "2000,4000");
        assert_eq!(config.consume_pacing.to_string(), "1000,3000,5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_values() {
        let config = ShopConfig {
            capacity: 0,
            ..ShopConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));

        let config = ShopConfig {
            num_producers: 0,
            ..ShopConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroProducers));

        let config = ShopConfig {
            request_quota: 0,
            ..ShopConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroQuota));

        let config = ShopConfig {
            wake_timeout: Some(Duration::ZERO),
            ..ShopConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroWakeTimeout));
    }

    #[test]
    fn session_config_carries_quota_and_pacing() {
        let config = ShopConfig::instant(3, 1);
        let session = config.session_config();
        assert_eq!(session.request_quota, DEFAULT_REQUEST_QUOTA);
        assert!(session.pacing.is_instant());
    }
}
