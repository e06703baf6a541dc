//! The per-scope circuit breaker state machine.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use tokio::time::Instant;

use crate::breaker::state::{BreakerStatus, CircuitState};
use crate::config::BreakerConfig;
use crate::error::{BreakerScope, CallError, CircuitOpenError};
use crate::observability::metrics;

/// Mutable breaker state. Every transition is serialized through the mutex
/// in [`Breaker`]; the lock is never held across an `.await`.
#[derive(Debug)]
struct BreakerCore {
    state: CircuitState,
    /// Failure instants inside the sliding window, oldest first.
    failure_timestamps: VecDeque<Instant>,
    /// Lifetime counters, observability only.
    total_failures: u64,
    total_successes: u64,
    last_failure_at: Option<Instant>,
    last_success_at: Option<Instant>,
    /// Set iff state == Open.
    opened_at: Option<Instant>,
    /// Probe admissions granted since entering Half-Open.
    probes_admitted: u32,
}

impl BreakerCore {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_timestamps: VecDeque::new(),
            total_failures: 0,
            total_successes: 0,
            last_failure_at: None,
            last_success_at: None,
            opened_at: None,
            probes_admitted: 0,
        }
    }
}

/// A circuit breaker guarding a single scope (global or one tenant).
///
/// Decides whether an attempt against the upstream is currently allowed and
/// updates its own history from call outcomes. Time-based transitions are
/// evaluated lazily on each query; there is no background timer.
#[derive(Debug)]
pub struct Breaker {
    scope: BreakerScope,
    config: BreakerConfig,
    core: Mutex<BreakerCore>,
}

impl Breaker {
    /// Create a breaker in the Closed state with empty history.
    pub fn new(scope: BreakerScope, config: BreakerConfig) -> Self {
        Self {
            scope,
            config,
            core: Mutex::new(BreakerCore::new()),
        }
    }

    /// The scope this breaker guards.
    pub fn scope(&self) -> &BreakerScope {
        &self.scope
    }

    /// Whether a call would currently be admitted.
    ///
    /// Re-evaluates the lazy Open → Half-Open transition first. Does not
    /// consume a half-open probe slot; admission happens in [`execute`].
    ///
    /// [`execute`]: Breaker::execute
    pub fn can_request(&self) -> bool {
        let now = Instant::now();
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        self.update_state_locked(&mut core, now);
        match core.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => core.probes_admitted < self.config.half_open_probes,
        }
    }

    /// Run `op` under this breaker's protection.
    ///
    /// Rejects with [`CallError::Open`] without invoking `op` when the
    /// circuit disallows the attempt. Otherwise the outcome is recorded and
    /// `op`'s own error, if any, is returned unmodified in
    /// [`CallError::Upstream`].
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.try_admit()?;
        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(CallError::Upstream(err))
            }
        }
    }

    /// Admit one attempt or reject with the breaker's own error.
    ///
    /// In Half-Open this consumes a probe slot, so at most
    /// `half_open_probes` attempts are in flight before an outcome resolves.
    pub(crate) fn try_admit(&self) -> Result<(), CircuitOpenError> {
        let now = Instant::now();
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        self.update_state_locked(&mut core, now);
        match core.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                metrics::record_rejected(&self.scope);
                Err(self.open_error_locked(&core))
            }
            CircuitState::HalfOpen => {
                if core.probes_admitted < self.config.half_open_probes {
                    core.probes_admitted += 1;
                    Ok(())
                } else {
                    metrics::record_rejected(&self.scope);
                    Err(self.open_error_locked(&core))
                }
            }
        }
    }

    /// Return a probe slot taken by [`try_admit`](Breaker::try_admit) when
    /// the protected call never ran (another layer rejected it).
    pub(crate) fn cancel_admission(&self) {
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        if core.state == CircuitState::HalfOpen && core.probes_admitted > 0 {
            core.probes_admitted -= 1;
        }
    }

    /// Record a successful call outcome.
    ///
    /// In Half-Open a single success is decisive: the circuit closes and the
    /// failure window is cleared.
    pub fn record_success(&self) {
        let now = Instant::now();
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        core.total_successes += 1;
        core.last_success_at = Some(now);
        metrics::record_call_outcome(&self.scope, true);
        if core.state == CircuitState::HalfOpen {
            self.close_locked(&mut core, "probe succeeded");
        }
    }

    /// Record a failed call outcome.
    ///
    /// Counters and the sliding window are updated in every state. Closed
    /// opens once the pruned window reaches the threshold; a Half-Open probe
    /// failure re-opens immediately with a fresh open timestamp.
    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        core.total_failures += 1;
        core.last_failure_at = Some(now);
        core.failure_timestamps.push_back(now);
        self.prune_window_locked(&mut core, now);
        metrics::record_call_outcome(&self.scope, false);
        match core.state {
            CircuitState::Closed => {
                if core.failure_timestamps.len() >= self.config.failure_threshold as usize {
                    self.open_locked(&mut core, now, "failure threshold reached");
                }
            }
            CircuitState::HalfOpen => {
                self.open_locked(&mut core, now, "probe failed");
            }
            CircuitState::Open => {}
        }
    }

    /// Snapshot the breaker, re-evaluating lazy transitions first.
    pub fn status(&self) -> BreakerStatus {
        let now = Instant::now();
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        self.update_state_locked(&mut core, now);
        self.prune_window_locked(&mut core, now);
        BreakerStatus {
            state: core.state,
            total_failures: core.total_failures,
            total_successes: core.total_successes,
            failures_in_window: core.failure_timestamps.len(),
            last_failure_at: core.last_failure_at,
            last_success_at: core.last_success_at,
            opened_at: core.opened_at,
            next_retry_at: core.opened_at.map(|at| at + self.config.open_duration()),
        }
    }

    /// Administrative override: open the circuit now, bypassing thresholds.
    ///
    /// Sets the open timestamp to now, so the circuit recovers through the
    /// normal lazy Half-Open path after `open_duration`.
    pub fn force_open(&self, reason: &str) {
        let now = Instant::now();
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        self.open_locked(&mut core, now, reason);
    }

    /// Administrative override: close the circuit now.
    ///
    /// Clears the failure window exactly like a natural close; lifetime
    /// counters are kept.
    pub fn force_close(&self) {
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        self.close_locked(&mut core, "forced closed");
    }

    /// Administrative override: move to Half-Open with a fresh probe quota.
    ///
    /// The failure window is kept, matching the natural Open → Half-Open
    /// transition.
    pub fn force_half_open(&self) {
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        core.state = CircuitState::HalfOpen;
        core.opened_at = None;
        core.probes_admitted = 0;
        metrics::record_state_transition(&self.scope, CircuitState::HalfOpen);
        tracing::info!(scope = %self.scope, "Circuit forced half-open");
    }

    /// Return the breaker to its just-constructed state: Closed, zero
    /// counters, empty history.
    pub fn reset(&self) {
        let mut core = self.core.lock().expect("breaker mutex poisoned");
        *core = BreakerCore::new();
        tracing::info!(scope = %self.scope, "Circuit reset");
    }

    /// Lazy Open → Half-Open transition. The failure history is kept: a
    /// failed probe must not need a fresh burst of failures to re-open.
    fn update_state_locked(&self, core: &mut BreakerCore, now: Instant) {
        if core.state != CircuitState::Open {
            return;
        }
        if let Some(opened_at) = core.opened_at {
            if now.duration_since(opened_at) >= self.config.open_duration() {
                core.state = CircuitState::HalfOpen;
                core.opened_at = None;
                core.probes_admitted = 0;
                metrics::record_state_transition(&self.scope, CircuitState::HalfOpen);
                tracing::info!(scope = %self.scope, "Circuit half-open, admitting probes");
            }
        }
    }

    /// Drop window entries strictly older than the failure window.
    fn prune_window_locked(&self, core: &mut BreakerCore, now: Instant) {
        let window = self.config.failure_window();
        while let Some(oldest) = core.failure_timestamps.front() {
            if now.duration_since(*oldest) > window {
                core.failure_timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn open_locked(&self, core: &mut BreakerCore, now: Instant, cause: &str) {
        core.state = CircuitState::Open;
        core.opened_at = Some(now);
        core.probes_admitted = 0;
        metrics::record_state_transition(&self.scope, CircuitState::Open);
        tracing::warn!(
            scope = %self.scope,
            cause,
            failures_in_window = core.failure_timestamps.len(),
            retry_in_ms = self.config.open_duration_ms,
            "Circuit opened"
        );
    }

    fn close_locked(&self, core: &mut BreakerCore, cause: &str) {
        core.state = CircuitState::Closed;
        core.opened_at = None;
        core.failure_timestamps.clear();
        core.probes_admitted = 0;
        metrics::record_state_transition(&self.scope, CircuitState::Closed);
        tracing::info!(scope = %self.scope, cause, "Circuit closed");
    }

    fn open_error_locked(&self, core: &BreakerCore) -> CircuitOpenError {
        CircuitOpenError {
            scope: self.scope.clone(),
            next_retry_at: core.opened_at.map(|at| at + self.config.open_duration()),
        }
    }
}
