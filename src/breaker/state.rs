//! Circuit state and status snapshot types.

use serde::Serialize;
use tokio::time::Instant;

/// The three positions of the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,
    /// Failing fast; calls are rejected without reaching the upstream.
    Open,
    /// Trial state; a bounded number of probe calls may pass.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

/// Point-in-time snapshot of one breaker.
///
/// Produced by [`Breaker::status`](crate::Breaker::status) after lazy state
/// re-evaluation; the admin route layer maps this to its own wire format.
#[derive(Debug, Clone)]
pub struct BreakerStatus {
    /// Current state.
    pub state: CircuitState,
    /// Lifetime failure count. Observability only, not used in transitions.
    pub total_failures: u64,
    /// Lifetime success count.
    pub total_successes: u64,
    /// Failures currently inside the sliding window.
    pub failures_in_window: usize,
    /// Instant of the most recent recorded failure.
    pub last_failure_at: Option<Instant>,
    /// Instant of the most recent recorded success.
    pub last_success_at: Option<Instant>,
    /// When the circuit opened. Set iff the state is Open.
    pub opened_at: Option<Instant>,
    /// Earliest instant a probe may be admitted. Set iff the state is Open.
    pub next_retry_at: Option<Instant>,
}
