//! Career domain model.
//!
//! # Responsibility
//! - Define canonical record shapes for employments, assignments and tags.
//! - Provide month-granularity date arithmetic used by every derived view.
//!
//! # Invariants
//! - Every record is identified by an `EntityId` unique across collections.
//! - Deletion is a hard, cascading delete; there are no tombstones.

pub mod career;
pub mod year_month;
