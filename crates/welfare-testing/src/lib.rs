//! Test utilities for welfare services.
//!
//! Provides `ManualClock` and the fixture loader.
//! Import in `#[cfg(test)]` blocks and integration tests only, never in production code.

pub mod clock;
pub mod fixture;
