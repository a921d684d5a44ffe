//! Configuration types for the registry core.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{RegistryError, Result, constants};

/// Top-level configuration for a `RegistryCore` instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Settlement worker timing.
    pub settlement: SettlementTiming,
    /// Anchoring epoch policy.
    pub anchoring: AnchorPolicy,
}

impl CoreConfig {
    /// Reject configurations the worker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.settlement.sweep_interval_ms == 0 {
            return Err(RegistryError::Configuration(
                "sweep_interval_ms must be positive".to_string(),
            ));
        }
        if self.anchoring.max_leaves_per_epoch == 0 {
            return Err(RegistryError::Configuration(
                "max_leaves_per_epoch must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Timing of the settlement worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementTiming {
    /// Delay between accepting an order and executing its fill. Zero is
    /// allowed (fill on next worker turn).
    pub fill_delay_ms: u64,
    /// Interval of the periodic sweep (expired orders, epoch rotation).
    pub sweep_interval_ms: u64,
}

impl SettlementTiming {
    #[must_use]
    pub fn fill_delay(&self) -> Duration {
        Duration::from_millis(self.fill_delay_ms)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for SettlementTiming {
    fn default() -> Self {
        Self {
            fill_delay_ms: constants::DEFAULT_FILL_DELAY_MS,
            sweep_interval_ms: constants::DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

/// When anchoring epochs seal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorPolicy {
    /// Leaf capacity; the epoch seals as soon as it is reached.
    pub max_leaves_per_epoch: usize,
    /// Whether the periodic sweep also seals a non-empty open epoch.
    pub seal_on_sweep: bool,
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        Self {
            max_leaves_per_epoch: constants::DEFAULT_MAX_LEAVES_PER_EPOCH,
            seal_on_sweep: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = CoreConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.settlement.fill_delay(), Duration::from_secs(3));
        assert_eq!(cfg.anchoring.max_leaves_per_epoch, 1_024);
        assert!(!cfg.anchoring.seal_on_sweep);
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let mut cfg = CoreConfig::default();
        cfg.settlement.sweep_interval_ms = 0;
        assert!(matches!(
            cfg.validate(),
            Err(RegistryError::Configuration(_))
        ));
    }

    #[test]
    fn zero_epoch_capacity_is_rejected() {
        let mut cfg = CoreConfig::default();
        cfg.anchoring.max_leaves_per_epoch = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = CoreConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.settlement.fill_delay_ms, back.settlement.fill_delay_ms);
        assert_eq!(
            cfg.anchoring.max_leaves_per_epoch,
            back.anchoring.max_leaves_per_epoch
        );
    }
}
