use std::error::Error;
use std::fmt;

use career_core::db::DbError;
use career_core::{LoggingError, RepoError, ValidationError};

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Db(DbError),
    Repo(RepoError),
    Validation(ValidationError),
    Json(serde_json::Error),
    Logging(LoggingError),
    InvalidArgument(String),
    NotFound(&'static str, u64),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(err) => write!(f, "I/O error: {}", err),
            CliError::Db(err) => write!(f, "database error: {}", err),
            CliError::Repo(err) => write!(f, "save failed: {}", err),
            CliError::Validation(err) => write!(f, "{}", err),
            CliError::Json(err) => write!(f, "JSON error: {}", err),
            CliError::Logging(err) => write!(f, "logging error: {}", err),
            CliError::InvalidArgument(message) => write!(f, "{}", message),
            CliError::NotFound(kind, id) => write!(f, "{} '{}' not found", kind, id),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            CliError::Db(err) => Some(err),
            CliError::Repo(err) => Some(err),
            CliError::Validation(err) => Some(err),
            CliError::Json(err) => Some(err),
            CliError::Logging(err) => Some(err),
            CliError::InvalidArgument(_) | CliError::NotFound(..) => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        CliError::Io(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        CliError::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        CliError::Repo(value)
    }
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        CliError::Validation(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        CliError::Json(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        CliError::Logging(value)
    }
}
