//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose career commands and views to Dart via FRB.
//! - Convert every core error into a message string.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each call opens the database, loads the store and drops it on return.
//! - View payloads are JSON strings with camelCase field names.

use career_core::db::open_db;
use career_core::{
    concise_report, core_version as core_version_inner, export_file_name, format_date_range,
    init_logging as init_logging_inner, search_all, tag_counts, timeline, AssignmentPatch,
    CareerService, Committed, CoreConfig, DeleteSummary, EmploymentPatch, EntityId, NewAssignment,
    NewEmployment, NewTag, SqliteKvRepository, TagCategory, TagKey, TagPatch, YearMonth,
};
use log::warn;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;
use time::OffsetDateTime;

static CAREER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type FfiService<'conn> = CareerService<SqliteKvRepository<'conn>>;

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope for commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerActionResponse {
    /// Whether the command was applied and saved.
    pub ok: bool,
    /// Id of the created or edited record.
    pub entity_id: Option<u64>,
    /// Human-readable message for the UI.
    pub message: String,
}

impl CareerActionResponse {
    fn success(message: impl Into<String>, entity_id: Option<EntityId>) -> Self {
        Self {
            ok: true,
            entity_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entity_id: None,
            message: message.into(),
        }
    }
}

/// Result envelope for read-only views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerViewResponse {
    pub ok: bool,
    /// JSON payload; empty on failure.
    pub json: String,
    pub message: String,
}

impl CareerViewResponse {
    fn from_result(result: Result<(Value, String), String>) -> Self {
        match result {
            Ok((payload, message)) => match serde_json::to_string(&payload) {
                Ok(json) => Self {
                    ok: true,
                    json,
                    message,
                },
                Err(err) => Self::failure(format!("view encoding failed: {err}")),
            },
            Err(message) => Self::failure(message),
        }
    }

    fn failure(message: String) -> Self {
        Self {
            ok: false,
            json: String::new(),
            message,
        }
    }
}

/// One `(name, category)` pair selected for a concise report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelection {
    pub name: String,
    pub category: String,
}

/// Creates an employment.
///
/// Dates are `YYYY-MM`; a blank or missing `end_date` means ongoing.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn career_create_employment(
    title: String,
    company: String,
    start_date: String,
    end_date: Option<String>,
) -> CareerActionResponse {
    action("career_create_employment", |service| {
        let (start_date, end_date) = parse_dates(&start_date, end_date.as_deref())?;
        let committed = service
            .add_employment(NewEmployment {
                title: title.trim().to_string(),
                company: company.trim().to_string(),
                start_date,
                end_date,
            })
            .map_err(|err| err.to_string())?;
        saved(committed, "Employment created.", |item| item.id)
    })
}

/// Replaces every editable field of an employment.
#[flutter_rust_bridge::frb(sync)]
pub fn career_update_employment(
    id: u64,
    title: String,
    company: String,
    start_date: String,
    end_date: Option<String>,
) -> CareerActionResponse {
    action("career_update_employment", |service| {
        let (start_date, end_date) = parse_dates(&start_date, end_date.as_deref())?;
        let patch = EmploymentPatch {
            title: Some(title.trim().to_string()),
            company: Some(company.trim().to_string()),
            start_date: Some(start_date),
            end_date: Some(end_date),
        };
        match service
            .edit_employment(id, patch)
            .map_err(|err| err.to_string())?
        {
            Some(committed) => saved(committed, "Employment updated.", |item| item.id),
            None => Err(format!("employment not found: {id}")),
        }
    })
}

/// Deletes an employment with its assignments and their tags.
#[flutter_rust_bridge::frb(sync)]
pub fn career_delete_employment(id: u64) -> CareerActionResponse {
    action("career_delete_employment", |service| {
        deleted(service.remove_employment(id), "employment")
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn career_create_assignment(
    employment_id: u64,
    title: String,
    description: String,
    start_date: String,
    end_date: Option<String>,
) -> CareerActionResponse {
    action("career_create_assignment", |service| {
        let (start_date, end_date) = parse_dates(&start_date, end_date.as_deref())?;
        let committed = service
            .add_assignment(NewAssignment {
                employment_id,
                title: title.trim().to_string(),
                description: description.trim().to_string(),
                start_date,
                end_date,
            })
            .map_err(|err| err.to_string())?;
        saved(committed, "Assignment created.", |item| item.id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn career_update_assignment(
    id: u64,
    employment_id: u64,
    title: String,
    description: String,
    start_date: String,
    end_date: Option<String>,
) -> CareerActionResponse {
    action("career_update_assignment", |service| {
        let (start_date, end_date) = parse_dates(&start_date, end_date.as_deref())?;
        let patch = AssignmentPatch {
            employment_id: Some(employment_id),
            title: Some(title.trim().to_string()),
            description: Some(description.trim().to_string()),
            start_date: Some(start_date),
            end_date: Some(end_date),
        };
        match service
            .edit_assignment(id, patch)
            .map_err(|err| err.to_string())?
        {
            Some(committed) => saved(committed, "Assignment updated.", |item| item.id),
            None => Err(format!("assignment not found: {id}")),
        }
    })
}

/// Deletes an assignment and its tags.
#[flutter_rust_bridge::frb(sync)]
pub fn career_delete_assignment(id: u64) -> CareerActionResponse {
    action("career_delete_assignment", |service| {
        deleted(service.remove_assignment(id), "assignment")
    })
}

/// Creates a tag; unknown category text is kept verbatim.
#[flutter_rust_bridge::frb(sync)]
pub fn career_create_tag(
    assignment_id: u64,
    name: String,
    category: String,
    description: String,
) -> CareerActionResponse {
    action("career_create_tag", |service| {
        let committed = service
            .add_tag(NewTag {
                assignment_id,
                name: name.trim().to_string(),
                category: TagCategory::parse(category.trim()),
                description: description.trim().to_string(),
            })
            .map_err(|err| err.to_string())?;
        saved(committed, "Tag created.", |item| item.id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn career_update_tag(
    id: u64,
    assignment_id: u64,
    name: String,
    category: String,
    description: String,
) -> CareerActionResponse {
    action("career_update_tag", |service| {
        let patch = TagPatch {
            assignment_id: Some(assignment_id),
            name: Some(name.trim().to_string()),
            category: Some(TagCategory::parse(category.trim())),
            description: Some(description.trim().to_string()),
        };
        match service.edit_tag(id, patch).map_err(|err| err.to_string())? {
            Some(committed) => saved(committed, "Tag updated.", |item| item.id),
            None => Err(format!("tag not found: {id}")),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn career_delete_tag(id: u64) -> CareerActionResponse {
    action("career_delete_tag", |service| {
        deleted(service.remove_tag(id), "tag")
    })
}

/// Employments with nested assignments and tags, newest first.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `json` is an array of `{employment, durationMonths, durationLabel,
///   dateRange, tagTotal, assignments}`.
#[flutter_rust_bridge::frb(sync)]
pub fn career_timeline() -> CareerViewResponse {
    view("career_timeline", |service| {
        let entries = timeline(service.store().data(), YearMonth::current());
        let mut payload = Vec::with_capacity(entries.len());
        for entry in &entries {
            let mut item = serde_json::to_value(entry).map_err(|err| err.to_string())?;
            item["tagTotal"] = json!(entry.tag_total());
            item["dateRange"] = json!(format_date_range(
                entry.employment.start_date,
                entry.employment.end_date
            ));
            payload.push(item);
        }
        let message = format!("{} employment(s).", entries.len());
        Ok((Value::Array(payload), message))
    })
}

/// Tag cloud entries with display styling.
///
/// `category` limits the result to one category; blank means all.
#[flutter_rust_bridge::frb(sync)]
pub fn career_tag_cloud(category: Option<String>) -> CareerViewResponse {
    view("career_tag_cloud", |service| {
        let filter = category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(TagCategory::parse);
        let counts = tag_counts(
            service.store().data(),
            filter.as_ref(),
            YearMonth::current(),
        );
        let payload = counts
            .iter()
            .map(|count| {
                let style = count.category.style();
                json!({
                    "name": count.name,
                    "category": count.category,
                    "count": count.count,
                    "totalMonths": count.total_months,
                    "durationLabel": count.duration_label,
                    "className": style.class_name,
                    "color": style.color,
                    "backgroundColor": style.background_color,
                })
            })
            .collect::<Vec<_>>();
        let message = format!("{} tag(s).", counts.len());
        Ok((Value::Array(payload), message))
    })
}

/// Categories offered by the tag form, with labels and colors.
#[flutter_rust_bridge::frb(sync)]
pub fn career_tag_categories() -> CareerViewResponse {
    let payload = TagCategory::known()
        .iter()
        .map(|category| {
            let style = category.style();
            json!({
                "value": category,
                "label": style.label,
                "className": style.class_name,
                "color": style.color,
                "backgroundColor": style.background_color,
            })
        })
        .collect::<Vec<_>>();
    CareerViewResponse::from_result(Ok((Value::Array(payload), String::new())))
}

/// Assignments matching any selected tag plus their total duration.
#[flutter_rust_bridge::frb(sync)]
pub fn career_concise_report(selection: Vec<TagSelection>) -> CareerViewResponse {
    view("career_concise_report", |service| {
        let keys = selection
            .into_iter()
            .map(|item| TagKey::new(item.name.trim(), TagCategory::parse(item.category.trim())))
            .collect::<BTreeSet<_>>();
        let report = concise_report(service.store().data(), &keys, YearMonth::current());
        let message = format!(
            "{} assignment(s), {}.",
            report.matches.len(),
            report.total_label
        );
        let payload = serde_json::to_value(&report).map_err(|err| err.to_string())?;
        Ok((payload, message))
    })
}

/// Case-insensitive search across all record types.
#[flutter_rust_bridge::frb(sync)]
pub fn career_search(query: String) -> CareerViewResponse {
    view("career_search", |service| {
        let results = search_all(service.store().data(), &query);
        let message = if results.total() == 0 {
            "No results.".to_string()
        } else {
            format!("Found {} result(s).", results.total())
        };
        let payload = serde_json::to_value(&results).map_err(|err| err.to_string())?;
        Ok((payload, message))
    })
}

/// Full export document; `message` carries the suggested file name.
#[flutter_rust_bridge::frb(sync)]
pub fn career_export() -> CareerViewResponse {
    let result = with_service(|service| {
        let document = service
            .store()
            .export_json()
            .map_err(|err| format!("export failed: {err}"))?;
        Ok((document, today_file_name()))
    });
    match result {
        Ok((json, message)) => CareerViewResponse {
            ok: true,
            json,
            message,
        },
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error call=career_export");
            CareerViewResponse::failure(message)
        }
    }
}

/// Replaces all data with an export document.
///
/// # FFI contract
/// - Never panics.
/// - On failure the stored data is unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn career_import(text: String) -> CareerActionResponse {
    match with_service(|service| Ok(service.store_mut().import_json(&text))) {
        Ok(outcome) if outcome.success => CareerActionResponse::success(outcome.message, None),
        Ok(outcome) => CareerActionResponse::failure(outcome.message),
        Err(message) => CareerActionResponse::failure(message),
    }
}

/// Deletes every record and resets id allocation.
#[flutter_rust_bridge::frb(sync)]
pub fn career_clear() -> CareerActionResponse {
    action("career_clear", |service| {
        service
            .store_mut()
            .clear_all()
            .persisted
            .map_err(|err| format!("save failed: {err}"))?;
        Ok((None, "All data cleared.".to_string()))
    })
}

fn action(
    call: &'static str,
    f: impl FnOnce(&mut FfiService<'_>) -> Result<(Option<EntityId>, String), String>,
) -> CareerActionResponse {
    match with_service(f) {
        Ok((entity_id, message)) => CareerActionResponse::success(message, entity_id),
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error call={call}");
            CareerActionResponse::failure(format!("{call} failed: {message}"))
        }
    }
}

fn view(
    call: &'static str,
    f: impl FnOnce(&mut FfiService<'_>) -> Result<(Value, String), String>,
) -> CareerViewResponse {
    let result = with_service(f).map_err(|message| {
        warn!("event=ffi_call module=ffi status=error call={call}");
        format!("{call} failed: {message}")
    });
    CareerViewResponse::from_result(result)
}

fn saved<T>(
    committed: Committed<T>,
    message: &str,
    id_of: impl FnOnce(&T) -> EntityId,
) -> Result<(Option<EntityId>, String), String> {
    committed
        .persisted
        .as_ref()
        .map_err(|err| format!("save failed: {err}"))?;
    Ok((Some(id_of(&committed.value)), message.to_string()))
}

fn deleted(
    committed: Committed<DeleteSummary>,
    kind: &str,
) -> Result<(Option<EntityId>, String), String> {
    committed
        .persisted
        .as_ref()
        .map_err(|err| format!("save failed: {err}"))?;
    let summary = committed.value;
    if summary.is_empty() {
        return Ok((None, format!("No {kind} deleted.")));
    }
    Ok((
        None,
        format!(
            "Deleted {} employment(s), {} assignment(s), {} tag(s).",
            summary.employments, summary.assignments, summary.tags
        ),
    ))
}

fn parse_dates(
    start: &str,
    end: Option<&str>,
) -> Result<(YearMonth, Option<YearMonth>), String> {
    let start_date = start
        .trim()
        .parse::<YearMonth>()
        .map_err(|err| format!("start date: {err}"))?;
    let end_date = match end.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Some(
            raw.parse::<YearMonth>()
                .map_err(|err| format!("end date: {err}"))?,
        ),
        None => None,
    };
    Ok((start_date, end_date))
}

fn today_file_name() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    export_file_name(now.date())
}

fn resolve_career_db_path() -> PathBuf {
    CAREER_DB_PATH
        .get_or_init(|| CoreConfig::from_env().db_path)
        .clone()
}

fn with_service<T>(
    f: impl FnOnce(&mut FfiService<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_career_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("career DB open failed: {err}"))?;
    let repo = SqliteKvRepository::try_new(&conn)
        .map_err(|err| format!("career repo init failed: {err}"))?;
    let mut service = CareerService::load(repo);
    f(&mut service)
}

#[cfg(test)]
mod tests {
    use super::{
        career_clear, career_concise_report, career_create_assignment, career_create_employment,
        career_create_tag, career_delete_employment, career_export, career_import,
        career_search, career_tag_categories, career_tag_cloud, career_timeline,
        career_update_employment, core_version, init_logging, parse_dates,
        resolve_career_db_path, TagSelection, CAREER_DB_PATH,
    };
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard};

    // All calls share one database file per process.
    static DB_LOCK: Mutex<()> = Mutex::new(());

    fn test_db_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("career-ffi-tests-{}", std::process::id()))
            .join("career.sqlite3")
    }

    /// Serializes database tests and pins them to a scratch file, never the
    /// configured database.
    fn isolated_db() -> MutexGuard<'static, ()> {
        let guard = DB_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let path = CAREER_DB_PATH.get_or_init(test_db_path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        guard
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn parse_dates_treats_blank_end_as_ongoing() {
        let (start, end) = parse_dates("2020-03", Some("  ")).unwrap();
        assert_eq!(start.to_string(), "2020-03");
        assert!(end.is_none());
        assert!(parse_dates("March", None).unwrap_err().contains("start date"));
    }

    #[test]
    fn database_tests_use_scratch_path() {
        let _guard = isolated_db();
        assert_eq!(resolve_career_db_path(), test_db_path());
        assert_ne!(
            resolve_career_db_path(),
            career_core::CoreConfig::from_env().db_path
        );
    }

    #[test]
    fn create_rejects_reversed_range() {
        let _guard = isolated_db();
        let response = career_create_employment(
            "Engineer".to_string(),
            "Acme".to_string(),
            "2022-05".to_string(),
            Some("2021-01".to_string()),
        );
        assert!(!response.ok);
        assert!(response.message.contains("invalid date range"));
    }

    #[test]
    fn commands_and_views_round_trip_through_database() {
        let _guard = isolated_db();
        assert!(career_clear().ok);

        let employment = career_create_employment(
            "QA Engineer".to_string(),
            "Initech".to_string(),
            "2021-01".to_string(),
            Some("2021-12".to_string()),
        );
        assert!(employment.ok, "{}", employment.message);
        let employment_id = employment.entity_id.unwrap();

        let assignment = career_create_assignment(
            employment_id,
            "Checkout".to_string(),
            String::new(),
            "2021-01".to_string(),
            None,
        );
        assert!(assignment.ok, "{}", assignment.message);
        let tag = career_create_tag(
            assignment.entity_id.unwrap(),
            "Cypress".to_string(),
            "test tech".to_string(),
            String::new(),
        );
        assert!(tag.ok, "{}", tag.message);

        let cloud = career_tag_cloud(None);
        assert!(cloud.ok, "{}", cloud.message);
        let cloud: serde_json::Value = serde_json::from_str(&cloud.json).unwrap();
        assert_eq!(cloud[0]["name"], "Cypress");
        assert_eq!(cloud[0]["count"], 1);
        assert_eq!(cloud[0]["totalMonths"], 11);
        assert_eq!(cloud[0]["className"], "test-tech");

        let timeline = career_timeline();
        let timeline: serde_json::Value = serde_json::from_str(&timeline.json).unwrap();
        assert_eq!(timeline[0]["tagTotal"], 1);
        assert_eq!(timeline[0]["dateRange"], "Jan 2021 - Dec 2021");

        let report = career_concise_report(vec![TagSelection {
            name: "Cypress".to_string(),
            category: "test tech".to_string(),
        }]);
        let report: serde_json::Value = serde_json::from_str(&report.json).unwrap();
        assert_eq!(report["totalMonths"], 11);

        let search = career_search("initech".to_string());
        assert!(search.message.contains('1'));

        let renamed = career_update_employment(
            employment_id,
            "Lead".to_string(),
            "Initech".to_string(),
            "2021-01".to_string(),
            None,
        );
        assert!(renamed.ok, "{}", renamed.message);

        let export = career_export();
        assert!(export.ok);
        assert!(export.message.starts_with("career-visualizer-export-"));

        let removed = career_delete_employment(employment_id);
        assert!(removed.message.contains("1 tag(s)"));
        let empty = career_tag_cloud(None);
        assert_eq!(empty.json, "[]");

        let restored = career_import(export.json);
        assert!(restored.ok, "{}", restored.message);
        let cloud = career_tag_cloud(Some("test tech".to_string()));
        assert!(cloud.json.contains("Cypress"));

        let rejected = career_import("{}".to_string());
        assert!(!rejected.ok);
        assert_eq!(rejected.message, "Import failed: Invalid data format");
    }

    #[test]
    fn tag_categories_lists_known_categories() {
        let response = career_tag_categories();
        let categories: serde_json::Value = serde_json::from_str(&response.json).unwrap();
        assert_eq!(categories.as_array().unwrap().len(), 3);
        assert_eq!(categories[0]["value"], "skill");
        assert_eq!(categories[0]["label"], "Skills");
    }
}
