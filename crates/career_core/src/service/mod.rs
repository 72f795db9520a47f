//! Core use-case services.
//!
//! # Responsibility
//! - Validate commands before they reach the store.
//! - Derive timeline, tag cloud and report views.
//! - Move the full store in and out as JSON documents.
//!
//! # Invariants
//! - Services never bypass store persistence.
//! - Derived views are pure functions of a `CareerData` snapshot and `today`.

pub mod aggregation;
pub mod career_service;
pub mod transfer;
