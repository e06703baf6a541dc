//! Tenant-scoped circuit breaker composition.
//!
//! # Data Flow
//! ```text
//! execute(tenant_id, op):
//!     → global breaker gate (correlated-failure protection)
//!     → tenant breaker gate (per-tenant isolation)
//!     → op() (the outbound tax authority call)
//!     → outcome recorded on both breakers
//! ```
//!
//! # Design Decisions
//! - The global threshold is a multiple of the tenant threshold: one tenant
//!   with rejected data trips only its own breaker, while a true upstream
//!   outage accumulates failures across tenants fast enough to trip the
//!   global one and short-circuit everybody at once
//! - Tenant breakers are created on first use and never evicted; admin
//!   actions reset them in place
//! - No process-wide singleton: the registry is constructed once at the
//!   embedding application's composition root and shared by reference

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

use crate::breaker::machine::Breaker;
use crate::breaker::state::BreakerStatus;
use crate::config::{BreakerConfig, RegistryConfig};
use crate::error::{BreakerScope, CallError};

/// Composite status for one tenant, as read by an admin status endpoint.
#[derive(Debug, Clone)]
pub struct RegistryStatus {
    /// The shared global breaker.
    pub global: BreakerStatus,
    /// The breaker isolating this tenant.
    pub tenant: BreakerStatus,
    /// True when both layers currently admit a call for this tenant.
    pub can_request: bool,
}

/// One global breaker composed with lazily-created per-tenant breakers.
///
/// Every protected call is gated by both layers and its outcome is recorded
/// into both.
#[derive(Debug)]
pub struct TenantBreakerRegistry {
    global: Breaker,
    by_tenant: DashMap<String, Arc<Breaker>>,
    tenant_config: BreakerConfig,
}

impl TenantBreakerRegistry {
    /// Create a registry from validated configuration.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            global: Breaker::new(BreakerScope::Global, config.global()),
            by_tenant: DashMap::new(),
            tenant_config: config.tenant,
        }
    }

    /// The breaker guarding a single tenant, created on first use.
    pub fn breaker_for(&self, tenant_id: &str) -> Arc<Breaker> {
        // entry() serializes first use; two callers cannot construct
        // duplicate breakers for the same tenant.
        self.by_tenant
            .entry(tenant_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(tenant = %tenant_id, "Creating tenant breaker");
                Arc::new(Breaker::new(
                    BreakerScope::Tenant(tenant_id.to_string()),
                    self.tenant_config.clone(),
                ))
            })
            .clone()
    }

    /// The shared global breaker, for admin overrides and status reads.
    pub fn global_breaker(&self) -> &Breaker {
        &self.global
    }

    /// Whether a call for this tenant would currently be admitted by both
    /// layers.
    pub fn can_request(&self, tenant_id: &str) -> bool {
        self.global.can_request() && self.breaker_for(tenant_id).can_request()
    }

    /// Run `op` for a tenant under both breakers.
    ///
    /// The global gate is checked first: during an upstream outage the
    /// rejection carries the global scope and the tenant breaker is not
    /// consulted. On an admitted call the outcome is recorded on both
    /// breakers; `op`'s own error is returned unmodified.
    pub async fn execute<F, Fut, T, E>(&self, tenant_id: &str, op: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.global.try_admit()?;
        let tenant = self.breaker_for(tenant_id);
        if let Err(rejection) = tenant.try_admit() {
            // The call never ran; give back the global probe slot so a
            // rejected tenant cannot strand the global half-open quota.
            self.global.cancel_admission();
            return Err(CallError::Open(rejection));
        }

        match op().await {
            Ok(value) => {
                tenant.record_success();
                self.global.record_success();
                Ok(value)
            }
            Err(err) => {
                tenant.record_failure();
                self.global.record_failure();
                Err(CallError::Upstream(err))
            }
        }
    }

    /// Composite status for one tenant.
    pub fn status(&self, tenant_id: &str) -> RegistryStatus {
        let tenant = self.breaker_for(tenant_id);
        RegistryStatus {
            can_request: self.global.can_request() && tenant.can_request(),
            global: self.global.status(),
            tenant: tenant.status(),
        }
    }

    /// Status of the global breaker alone.
    pub fn global_status(&self) -> BreakerStatus {
        self.global.status()
    }

    /// Status of every tenant seen so far, for the admin listing view.
    pub fn statuses(&self) -> Vec<(String, BreakerStatus)> {
        self.by_tenant
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().status()))
            .collect()
    }

    /// Reset one tenant's breaker. Unknown tenants are a no-op.
    pub fn reset(&self, tenant_id: &str) {
        if let Some(breaker) = self.by_tenant.get(tenant_id) {
            breaker.reset();
        }
    }

    /// Reset the global breaker and every tenant breaker.
    pub fn reset_all(&self) {
        self.global.reset();
        for entry in self.by_tenant.iter() {
            entry.value().reset();
        }
    }

    /// Operator action: force the global breaker open, blocking calls for
    /// every tenant (e.g. during announced upstream maintenance).
    pub fn force_open_all(&self, reason: &str) {
        self.global.force_open(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::state::CircuitState;

    fn test_registry() -> TenantBreakerRegistry {
        TenantBreakerRegistry::new(RegistryConfig {
            tenant: BreakerConfig {
                failure_threshold: 2,
                open_duration_ms: 1_000,
                half_open_probes: 1,
                failure_window_ms: 60_000,
            },
            global_threshold_multiplier: 3,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_for_returns_the_same_instance() {
        let registry = test_registry();
        let first = registry.breaker_for("acme");
        let second = registry.breaker_for("acme");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            *first.scope(),
            BreakerScope::Tenant("acme".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn global_breaker_uses_the_scaled_threshold() {
        let registry = test_registry();
        for _ in 0..5 {
            registry.global_breaker().record_failure();
        }
        assert_eq!(registry.global_status().state, CircuitState::Closed);
        registry.global_breaker().record_failure();
        assert_eq!(registry.global_status().state, CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn statuses_lists_only_seen_tenants() {
        let registry = test_registry();
        assert!(registry.statuses().is_empty());

        registry.breaker_for("acme");
        registry.breaker_for("globex");
        let mut ids: Vec<String> = registry
            .statuses()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["acme".to_string(), "globex".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_of_unknown_tenant_is_a_noop() {
        let registry = test_registry();
        registry.reset("nobody");
        assert!(registry.statuses().is_empty());
    }
}
