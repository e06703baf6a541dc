//! Metric recording helpers.
//!
//! # Metrics
//! - `afip_breaker_transitions_total` (counter): state transitions by scope and target state
//! - `afip_breaker_calls_total` (counter): recorded call outcomes by scope
//! - `afip_breaker_rejected_total` (counter): calls rejected without reaching the upstream

use crate::breaker::state::CircuitState;
use crate::error::BreakerScope;

fn scope_label(scope: &BreakerScope) -> String {
    match scope {
        BreakerScope::Global => "global".to_string(),
        BreakerScope::Tenant(id) => format!("tenant:{}", id),
    }
}

/// Record a breaker state transition.
pub fn record_state_transition(scope: &BreakerScope, to: CircuitState) {
    metrics::counter!(
        "afip_breaker_transitions_total",
        "scope" => scope_label(scope),
        "to" => to.to_string()
    )
    .increment(1);
}

/// Record the outcome of a protected call.
pub fn record_call_outcome(scope: &BreakerScope, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "afip_breaker_calls_total",
        "scope" => scope_label(scope),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a call rejected without reaching the upstream.
pub fn record_rejected(scope: &BreakerScope) {
    metrics::counter!(
        "afip_breaker_rejected_total",
        "scope" => scope_label(scope)
    )
    .increment(1);
}
