//! Derived career views: timeline, tag cloud counts and concise reports.
//!
//! # Responsibility
//! - Join employments, assignments and tags into render-ready view models.
//! - Compute tag usage with per-employment deduplication.
//! - Match assignments against a selected tag set and total their duration.
//!
//! # Invariants
//! - Month counts are computed numerically and carried next to their labels.
//! - One employment contributes at most once per tag key to `count`, with
//!   its union span (earliest start to latest resolved end).
//! - Report totals use each matched employment's own duration once.
//! - Records whose parent is missing are skipped, never reported.

use crate::model::career::{
    compare_names, Assignment, CareerData, Employment, EntityId, Tag, TagCategory, TagKey,
};
use crate::model::year_month::{duration_months, format_duration, format_span, YearMonth};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Employment with its assignments and tags eagerly joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub employment: Employment,
    pub duration_months: u32,
    pub duration_label: String,
    /// Ordered by start date, newest first.
    pub assignments: Vec<TimelineAssignment>,
}

impl TimelineEntry {
    /// Number of tags across all assignments of this employment.
    pub fn tag_total(&self) -> usize {
        self.assignments.iter().map(|item| item.tags.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineAssignment {
    pub assignment: Assignment,
    pub duration_months: u32,
    pub duration_label: String,
    /// Ordered by name.
    pub tags: Vec<Tag>,
}

/// Tag cloud entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub name: String,
    pub category: TagCategory,
    /// Number of distinct employments using this tag.
    pub count: usize,
    pub total_months: u32,
    pub duration_label: String,
}

/// One assignment satisfying a concise-report selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentMatch {
    pub assignment: Assignment,
    pub employment: Employment,
    /// Tags of this assignment whose key is selected, ordered by name.
    pub matched_tags: Vec<Tag>,
}

/// Concise report: matches plus their deduplicated total duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConciseReport {
    pub matches: Vec<AssignmentMatch>,
    pub total_months: u32,
    pub total_label: String,
}

/// Builds the full timeline, newest employment first.
pub fn timeline(data: &CareerData, today: YearMonth) -> Vec<TimelineEntry> {
    data.sorted_employments()
        .into_iter()
        .map(|employment| timeline_entry(data, employment, today))
        .collect()
}

/// Timeline entry for one employment; `None` when the id is unknown.
pub fn employment_with_related(
    data: &CareerData,
    employment_id: EntityId,
    today: YearMonth,
) -> Option<TimelineEntry> {
    let employment = data.employment(employment_id)?.clone();
    Some(timeline_entry(data, employment, today))
}

fn timeline_entry(data: &CareerData, employment: Employment, today: YearMonth) -> TimelineEntry {
    let assignments = data
        .sorted_assignments(Some(employment.id))
        .into_iter()
        .map(|assignment| TimelineAssignment {
            duration_months: duration_months(assignment.start_date, assignment.end_date, today),
            duration_label: format_span(assignment.start_date, assignment.end_date, today),
            tags: data.sorted_tags(Some(assignment.id), None),
            assignment,
        })
        .collect();

    TimelineEntry {
        duration_months: duration_months(employment.start_date, employment.end_date, today),
        duration_label: format_span(employment.start_date, employment.end_date, today),
        assignments,
        employment,
    }
}

/// Per-tag usage counts for the tag cloud.
///
/// Ordered by `count` descending, then by name. `category` limits the
/// result to one category.
pub fn tag_counts(
    data: &CareerData,
    category: Option<&TagCategory>,
    today: YearMonth,
) -> Vec<TagCount> {
    // tag key -> employment id -> assignments carrying that key
    let mut grouped: BTreeMap<TagKey, BTreeMap<EntityId, Vec<&Assignment>>> = BTreeMap::new();
    for tag in &data.tags {
        if category.is_some_and(|category| &tag.category != category) {
            continue;
        }
        let Some(assignment) = data.assignment(tag.assignment_id) else {
            continue;
        };
        grouped
            .entry(tag.key())
            .or_default()
            .entry(assignment.employment_id)
            .or_default()
            .push(assignment);
    }

    let mut counts = Vec::with_capacity(grouped.len());
    for (key, by_employment) in grouped {
        let mut count = 0;
        let mut total_months = 0u32;
        for (employment_id, assignments) in by_employment {
            let Some(employment) = data.employment(employment_id) else {
                continue;
            };
            count += 1;
            total_months = total_months.saturating_add(union_span(employment, &assignments, today));
        }
        if count == 0 {
            continue;
        }
        counts.push(TagCount {
            name: key.name,
            category: key.category,
            count,
            total_months,
            duration_label: format_duration(total_months),
        });
    }

    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| compare_names(&a.name, &b.name))
            .then_with(|| a.category.cmp(&b.category))
    });
    counts
}

/// Months from the earliest assignment start to the latest resolved end.
///
/// An open assignment ends with its employment; if both are open it ends
/// `today`.
fn union_span(employment: &Employment, assignments: &[&Assignment], today: YearMonth) -> u32 {
    let Some(start) = assignments.iter().map(|item| item.start_date).min() else {
        return 0;
    };
    let end = assignments
        .iter()
        .map(|item| item.end_date.or(employment.end_date).unwrap_or(today))
        .max()
        .unwrap_or(today);
    duration_months(start, Some(end), today)
}

/// Assignments holding at least one selected tag, newest first.
pub fn match_assignments_by_tags(
    data: &CareerData,
    selection: &BTreeSet<TagKey>,
) -> Vec<AssignmentMatch> {
    if selection.is_empty() {
        return Vec::new();
    }

    let mut matched: HashMap<EntityId, Vec<Tag>> = HashMap::new();
    for tag in &data.tags {
        if selection.contains(&tag.key()) {
            matched.entry(tag.assignment_id).or_default().push(tag.clone());
        }
    }

    let mut matches = Vec::with_capacity(matched.len());
    for (assignment_id, mut matched_tags) in matched {
        let Some(assignment) = data.assignment(assignment_id) else {
            continue;
        };
        let Some(employment) = data.employment(assignment.employment_id) else {
            continue;
        };
        matched_tags.sort_by(|a, b| compare_names(&a.name, &b.name));
        matches.push(AssignmentMatch {
            assignment: assignment.clone(),
            employment: employment.clone(),
            matched_tags,
        });
    }

    matches.sort_by(|a, b| {
        b.assignment
            .start_date
            .cmp(&a.assignment.start_date)
            .then_with(|| a.assignment.id.cmp(&b.assignment.id))
    });
    matches
}

/// Sums the full duration of each distinct employment among `matches`.
pub fn total_duration_for_report(matches: &[AssignmentMatch], today: YearMonth) -> u32 {
    let mut seen = BTreeSet::new();
    matches
        .iter()
        .filter(|item| seen.insert(item.employment.id))
        .map(|item| duration_months(item.employment.start_date, item.employment.end_date, today))
        .fold(0u32, u32::saturating_add)
}

/// Runs matching and totals in one call.
pub fn concise_report(
    data: &CareerData,
    selection: &BTreeSet<TagKey>,
    today: YearMonth,
) -> ConciseReport {
    let matches = match_assignments_by_tags(data, selection);
    let total_months = total_duration_for_report(&matches, today);
    ConciseReport {
        matches,
        total_months,
        total_label: format_duration(total_months),
    }
}
