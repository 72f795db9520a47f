//! Case-insensitive substring search over career records.
//!
//! # Responsibility
//! - Match a query against a fixed field set per record type.
//!
//! # Invariants
//! - The query is used as given, surrounding whitespace included.
//! - An empty query matches every record.
//! - Results keep storage order; callers sort for display.

use crate::model::career::{Assignment, CareerData, Employment, Tag};
use serde::Serialize;

/// Hits across all three collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub employments: Vec<Employment>,
    pub assignments: Vec<Assignment>,
    pub tags: Vec<Tag>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.employments.len() + self.assignments.len() + self.tags.len()
    }
}

/// Matches employment `title` and `company`.
pub fn search_employments(data: &CareerData, query: &str) -> Vec<Employment> {
    let needle = query.to_lowercase();
    data.employments
        .iter()
        .filter(|item| contains_any(&needle, &[item.title.as_str(), item.company.as_str()]))
        .cloned()
        .collect()
}

/// Matches assignment `title` and `description`.
pub fn search_assignments(data: &CareerData, query: &str) -> Vec<Assignment> {
    let needle = query.to_lowercase();
    data.assignments
        .iter()
        .filter(|item| contains_any(&needle, &[item.title.as_str(), item.description.as_str()]))
        .cloned()
        .collect()
}

/// Matches tag `name`, `description` and category text.
pub fn search_tags(data: &CareerData, query: &str) -> Vec<Tag> {
    let needle = query.to_lowercase();
    data.tags
        .iter()
        .filter(|item| {
            contains_any(
                &needle,
                &[
                    item.name.as_str(),
                    item.description.as_str(),
                    item.category.as_str(),
                ],
            )
        })
        .cloned()
        .collect()
}

pub fn search_all(data: &CareerData, query: &str) -> SearchResults {
    SearchResults {
        employments: search_employments(data, query),
        assignments: search_assignments(data, query),
        tags: search_tags(data, query),
    }
}

fn contains_any(needle: &str, haystacks: &[&str]) -> bool {
    needle.is_empty()
        || haystacks
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(needle))
}
