//! Ambient plumbing shared by welfare services: configuration, tracing, health probes,
//! request ids, and the clock.

pub mod clock;
pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
