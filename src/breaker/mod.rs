//! Circuit breaker state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: testing if upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failures within failure_window reach failure_threshold
//! Open → Half-Open: open_duration elapsed (evaluated lazily, no timer)
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails
//! ```
//!
//! # Design Decisions
//! - Transitions are evaluated on demand; a breaker nobody queries never moves
//! - Fail fast in Open state, carrying the earliest retry instant
//! - Half-Open admits at most half_open_probes attempts before an outcome
//! - Administrative overrides reuse the same transitions and leave the
//!   breaker on the normal lazy recovery path

pub mod machine;
pub mod state;

pub use machine::Breaker;
pub use state::{BreakerStatus, CircuitState};
