//! Configuration for the circuit breaking layer.
//!
//! # Data Flow
//! ```text
//! embedding application config (file/env)
//!     → schema.rs (serde deserialization, defaults)
//!     → validation.rs (semantic checks)
//!     → RegistryConfig (validated, immutable)
//!     → TenantBreakerRegistry::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a registry is constructed
//! - All fields have defaults so an empty config section works
//! - Validation separates syntactic (serde) from semantic checks
//! - Validation returns all errors, not just the first

pub mod schema;
pub mod validation;

pub use schema::{BreakerConfig, RegistryConfig};
pub use validation::{validate_config, ValidationError};
