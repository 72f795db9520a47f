//! Versioned JSON export and lenient, validated import.
//!
//! # Responsibility
//! - Serialize the full store into an export document.
//! - Parse and normalize an imported document before it replaces the store.
//!
//! # Invariants
//! - Import never touches the store until parsing and normalization succeed.
//! - An import that cannot be saved is rolled back and reported as failed.
//! - Imported `nextId` is ignored and recomputed as `max(id) + 1`; a document
//!   whose largest id leaves no room for that is rejected.
//! - Missing sub-collections default to empty.

use crate::model::career::CareerData;
use crate::repo::career_repo::CareerStore;
use crate::repo::kv_repo::KeyValueStore;
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// Document format version written by [`export_document`].
pub const EXPORT_VERSION: &str = "1.0.0";

/// Failure to accept an import document.
#[derive(Debug)]
pub enum ImportError {
    /// Text is not valid JSON.
    Json(serde_json::Error),
    /// Top-level `data` is missing or not an object.
    MissingData,
    /// A record inside `data` has the wrong shape.
    InvalidRecord(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid JSON: {err}"),
            Self::MissingData => write!(f, "Invalid data format"),
            Self::InvalidRecord(message) => write!(f, "invalid record: {message}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::MissingData | Self::InvalidRecord(_) => None,
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// User-facing outcome of an import attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    version: &'a str,
    export_date: String,
    data: &'a CareerData,
}

/// Renders the pretty-printed export document.
pub fn export_document(
    data: &CareerData,
    exported_at: OffsetDateTime,
) -> serde_json::Result<String> {
    let document = ExportDocument {
        version: EXPORT_VERSION,
        export_date: exported_at.format(&Rfc3339).unwrap_or_default(),
        data,
    };
    serde_json::to_string_pretty(&document)
}

/// Suggested file name for an export taken on `date`.
pub fn export_file_name(date: Date) -> String {
    format!(
        "career-visualizer-export-{:04}-{:02}-{:02}.json",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses and normalizes an export document.
///
/// # Errors
/// - `Json` when `text` is not JSON.
/// - `MissingData` when `data` is absent or not an object.
/// - `InvalidRecord` when a record has the wrong shape or an id is too large
///   to leave a next id.
pub fn parse_import(text: &str) -> Result<CareerData, ImportError> {
    let document: Value = serde_json::from_str(text)?;
    let data = match document.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => return Err(ImportError::MissingData),
    };

    let mut data: CareerData = serde_json::from_value(data)
        .map_err(|err| ImportError::InvalidRecord(err.to_string()))?;
    data.next_id = data
        .next_free_id()
        .ok_or_else(|| ImportError::InvalidRecord("id out of range".to_string()))?;
    Ok(data)
}

impl<K: KeyValueStore> CareerStore<K> {
    /// Exports the current store as a pretty-printed document.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let document = export_document(self.data(), OffsetDateTime::now_utc())?;
        info!(
            "event=export module=transfer status=ok bytes={}",
            document.len()
        );
        Ok(document)
    }

    /// Replaces the store with an imported document.
    ///
    /// Never panics; failures, including a failed save, leave the store
    /// untouched and are described in the returned message.
    pub fn import_json(&mut self, text: &str) -> ImportOutcome {
        match parse_import(text) {
            Ok(data) => {
                let previous = self.data().clone();
                let committed = self.replace_data(data);
                match committed.persisted {
                    Ok(()) => {
                        info!(
                            "event=import module=transfer status=ok next_id={}",
                            self.data().next_id
                        );
                        ImportOutcome {
                            success: true,
                            message: "Data imported successfully".to_string(),
                        }
                    }
                    Err(err) => {
                        self.restore_unsaved(previous);
                        error!(
                            "event=import module=transfer status=error error_code=save_failed error={err}"
                        );
                        ImportOutcome {
                            success: false,
                            message: format!("Import failed: could not save data: {err}"),
                        }
                    }
                }
            }
            Err(err) => {
                error!("event=import module=transfer status=error error={err}");
                ImportOutcome {
                    success: false,
                    message: format!("Import failed: {err}"),
                }
            }
        }
    }
}
