//! Domain types shared across all welfare services.
//!
//! Pure types and rules with no framework dependencies.

pub mod eligibility;
pub mod id;
pub mod identity;
