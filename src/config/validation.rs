//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, durations and probe quotas nonzero)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into a registry

use thiserror::Error;

use crate::config::schema::{BreakerConfig, RegistryConfig};

/// A single semantic defect in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{scope}: failure_threshold must be at least 1")]
    ZeroFailureThreshold { scope: &'static str },

    #[error("{scope}: open_duration_ms must be at least 1")]
    ZeroOpenDuration { scope: &'static str },

    #[error("{scope}: half_open_probes must be at least 1")]
    ZeroHalfOpenProbes { scope: &'static str },

    #[error("{scope}: failure_window_ms must be at least 1")]
    ZeroFailureWindow { scope: &'static str },

    #[error("global_threshold_multiplier must be at least 1")]
    ZeroGlobalMultiplier,
}

fn validate_breaker(
    config: &BreakerConfig,
    scope: &'static str,
    errors: &mut Vec<ValidationError>,
) {
    if config.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold { scope });
    }
    if config.open_duration_ms == 0 {
        errors.push(ValidationError::ZeroOpenDuration { scope });
    }
    if config.half_open_probes == 0 {
        errors.push(ValidationError::ZeroHalfOpenProbes { scope });
    }
    if config.failure_window_ms == 0 {
        errors.push(ValidationError::ZeroFailureWindow { scope });
    }
}

/// Validate a registry configuration, collecting every defect.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_breaker(&config.tenant, "tenant", &mut errors);
    if config.global_threshold_multiplier == 0 {
        errors.push(ValidationError::ZeroGlobalMultiplier);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
