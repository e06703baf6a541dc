//! Circuit breaking for outbound AFIP (tax authority) API calls.
//!
//! One breaker isolates each tenant's failure history; a shared global
//! breaker with a higher threshold catches failures correlated across
//! tenants (the upstream itself being down). Every protected call is gated
//! by both layers.

pub mod breaker;
pub mod config;
pub mod error;
pub mod observability;
pub mod registry;

pub use breaker::machine::Breaker;
pub use breaker::state::{BreakerStatus, CircuitState};
pub use config::{BreakerConfig, RegistryConfig};
pub use error::{BreakerScope, CallError, CircuitOpenError};
pub use registry::{RegistryStatus, TenantBreakerRegistry};
