//! Agegate Core
//!
//! Domain types and pure logic for the age-verification backend:
//! verification attempts, user profiles, notification records, and the
//! classification of provider webhook events into verification outcomes.
//!
//! Persistence lives in `agegate-store` and HTTP in `agegate-api`; this
//! crate stays free of IO so the scoring and mapping rules remain directly
//! unit-testable.

pub mod outcome;
pub mod types;

pub use outcome::*;
pub use types::*;
