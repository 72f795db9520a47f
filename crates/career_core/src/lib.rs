//! Core domain logic for the career tracker.
//! This crate is the single source of truth for career data invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::career::{
    Assignment, AssignmentPatch, CareerData, CategoryStyle, Employment, EmploymentPatch,
    EntityId, IdSpaceExhausted, NewAssignment, NewEmployment, NewTag, Tag, TagCategory, TagKey,
    TagPatch,
};
pub use model::year_month::{
    duration_months, format_date, format_date_range, format_duration, format_span,
    is_valid_range, parse_range, MonthRange, YearMonth, YearMonthParseError,
};
pub use repo::career_repo::{CareerStore, Committed, DeleteSummary, STORAGE_KEY};
pub use repo::kv_repo::{
    InMemoryKvRepository, KeyValueStore, RepoError, RepoResult, SqliteKvRepository,
};
pub use search::text::{
    search_all, search_assignments, search_employments, search_tags, SearchResults,
};
pub use service::aggregation::{
    concise_report, employment_with_related, match_assignments_by_tags, tag_counts, timeline,
    total_duration_for_report, AssignmentMatch, ConciseReport, TagCount, TimelineAssignment,
    TimelineEntry,
};
pub use service::career_service::{CareerService, ServiceResult, ValidationError};
pub use service::transfer::{
    export_document, export_file_name, parse_import, ImportError, ImportOutcome, EXPORT_VERSION,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
