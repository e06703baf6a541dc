//! Observability subsystem.
//!
//! # Design Decisions
//! - Metrics go through the `metrics` facade; the embedding application
//!   installs the exporter at its composition root
//! - Recording helpers are cheap and never fail
//! - State transitions are additionally logged via `tracing` at the call site

pub mod metrics;
