//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the embedding
//! application's config files. Durations are plain millisecond fields.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a single circuit breaker scope.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures within the sliding window required to open the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays open before a probe is admitted (ms).
    pub open_duration_ms: u64,

    /// Probe attempts admitted while half-open.
    pub half_open_probes: u32,

    /// Sliding window over which failures count toward the threshold (ms).
    pub failure_window_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration_ms: 300_000,
            half_open_probes: 1,
            failure_window_ms: 60_000,
        }
    }
}

impl BreakerConfig {
    /// Open duration as a [`Duration`].
    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }

    /// Failure window as a [`Duration`].
    pub fn failure_window(&self) -> Duration {
        Duration::from_millis(self.failure_window_ms)
    }
}

/// Settings for the tenant breaker registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Breaker settings shared by every per-tenant breaker.
    pub tenant: BreakerConfig,

    /// The global breaker threshold is the tenant threshold times this
    /// factor. One misbehaving tenant trips only its own breaker; an
    /// upstream outage accumulates failures across tenants fast enough to
    /// trip the global one.
    pub global_threshold_multiplier: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tenant: BreakerConfig::default(),
            global_threshold_multiplier: 3,
        }
    }
}

impl RegistryConfig {
    /// Derive the global breaker settings: same window and durations as the
    /// tenant breakers, a higher threshold.
    pub fn global(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self
                .tenant
                .failure_threshold
                .saturating_mul(self.global_threshold_multiplier),
            ..self.tenant.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.tenant.failure_threshold, 5);
        assert_eq!(config.tenant.open_duration_ms, 300_000);
        assert_eq!(config.tenant.half_open_probes, 1);
        assert_eq!(config.tenant.failure_window_ms, 60_000);
        assert_eq!(config.global_threshold_multiplier, 3);
    }

    #[test]
    fn global_config_scales_threshold_only() {
        let config = RegistryConfig::default();
        let global = config.global();
        assert_eq!(global.failure_threshold, 15);
        assert_eq!(global.open_duration_ms, config.tenant.open_duration_ms);
        assert_eq!(global.failure_window_ms, config.tenant.failure_window_ms);
        assert_eq!(global.half_open_probes, config.tenant.half_open_probes);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: RegistryConfig = serde_json::from_str(
            r#"{ "tenant": { "failure_threshold": 2 }, "global_threshold_multiplier": 4 }"#,
        )
        .unwrap();
        assert_eq!(config.tenant.failure_threshold, 2);
        assert_eq!(config.tenant.failure_window_ms, 60_000);
        assert_eq!(config.global().failure_threshold, 8);
    }

    #[test]
    fn empty_config_is_usable() {
        let config: RegistryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.global().failure_threshold, 15);
    }
}
