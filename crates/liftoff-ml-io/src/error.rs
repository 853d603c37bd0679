use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading inputs or writing outputs.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Input not found at {}. {hint}", path.display())]
    MissingInput { path: PathBuf, hint: String },

    #[error("Schema error in column '{column}': {reason}")]
    Schema { column: String, reason: String },

    #[error("Failed to write {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("Invalid artifact at {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },
}

pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    pub(crate) fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        DataError::Schema {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
