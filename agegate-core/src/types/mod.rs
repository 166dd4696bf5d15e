//! Core type definitions for the verification service
//!
//! Naming conventions:
//! - snake_case for field names
//! - *_id suffix for primary keys
//! - timestamps are `chrono::DateTime<Utc>`, stamped by the caller

mod attempt;
mod event;
mod notification;
mod profile;

pub use attempt::*;
pub use event::*;
pub use notification::*;
pub use profile::*;
