//! Error types for the ossprey core library.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyLookupError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;

use crate::models::DataSource;

/// Top-level error enum for the ossprey core library.
///
/// Conditions where a query resolved correctly but found nothing to ground an
/// answer on (no matching rule, zero rows, empty corpus) are *not* errors;
/// they travel as [`crate::query::router::InsufficientReason`] values.
#[derive(Debug, thiserror::Error)]
pub enum OsspreyError {
    #[error("No {data_source} loaded for project '{project_id}'")]
    MissingDataset {
        project_id: String,
        data_source: DataSource,
    },

    #[error("Invalid dataset record at row {row}: {reason}")]
    InvalidDataset { row: usize, reason: String },

    #[error("Invalid corpus: {0}")]
    InvalidCorpus(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OsspreyError {
    pub fn missing(project_id: &str, data_source: DataSource) -> Self {
        OsspreyError::MissingDataset {
            project_id: project_id.to_string(),
            data_source,
        }
    }
}

#[cfg(feature = "python")]
impl From<OsspreyError> for PyErr {
    fn from(err: OsspreyError) -> PyErr {
        match &err {
            OsspreyError::MissingDataset { .. } => PyLookupError::new_err(err.to_string()),
            OsspreyError::InvalidDataset { .. } | OsspreyError::InvalidCorpus(_) => {
                PyValueError::new_err(err.to_string())
            }
            OsspreyError::Config(_) | OsspreyError::Json(_) => {
                PyValueError::new_err(err.to_string())
            }
            OsspreyError::Embedding(_) => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

pub type OsspreyResult<T> = Result<T, OsspreyError>;
