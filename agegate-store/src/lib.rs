//! Agegate Store
//!
//! Persistence for verification attempts, user profiles and notification
//! records behind the [`VerificationStore`] trait. Two backends:
//! [`MemoryStore`] for tests and development, [`SledStore`] for durable
//! single-node deployments.
//!
//! The store is the serialization point for the webhook pipeline: the
//! `finalize_attempt` primitive is a conditional update ("only while still
//! pending") so concurrent or retried deliveries for one session decide an
//! attempt at most once.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{
    FinalizeStatus, MemoryStore, SledStore, StoreConfig, StoreStats, VerificationStore,
};
