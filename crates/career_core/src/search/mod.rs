//! Text search entry points.
//!
//! # Responsibility
//! - Expose substring search over the in-memory career snapshot.

pub mod text;
