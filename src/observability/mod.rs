//! # Observability Infrastructure
//!
//! Structured logging for the listener translator. The translation core only
//! emits `tracing` events; installing a subscriber is left to the binary.

pub mod logging;

pub use logging::init_logging;
