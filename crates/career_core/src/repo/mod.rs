//! Repository layer: storage contracts and the owning career store.
//!
//! # Responsibility
//! - Define the key-value persistence contract and its implementations.
//! - Own the in-memory career records and write them through on mutation.
//!
//! # Invariants
//! - Storage failures surface as `RepoError` values, never panics.
//! - Lookups of unknown ids return `None` instead of errors.

pub mod career_repo;
pub mod kv_repo;
