use liftoff_ml_core::MlError;
use liftoff_ml_io::DataError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop (or, for a single candidate, dent) a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input not found at {}. {hint}", path.display())]
    MissingInput { path: PathBuf, hint: String },

    #[error("Schema error in column '{column}': {reason}")]
    Schema { column: String, reason: String },

    #[error("Class {class} has {count} rows, at least {required} required")]
    InsufficientSamples {
        class: u8,
        count: usize,
        required: usize,
    },

    #[error("Candidate '{candidate}' failed: {source}")]
    CandidateTraining {
        candidate: String,
        #[source]
        source: MlError,
    },

    #[error("Every candidate failed; nothing to select")]
    NoCandidates,

    #[error("Failed to write {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid artifact at {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error(transparent)]
    Model(MlError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn candidate(name: &str, source: MlError) -> Self {
        PipelineError::CandidateTraining {
            candidate: name.to_string(),
            source,
        }
    }
}

impl From<DataError> for PipelineError {
    fn from(e: DataError) -> Self {
        match e {
            DataError::MissingInput { path, hint } => PipelineError::MissingInput { path, hint },
            DataError::Schema { column, reason } => PipelineError::Schema { column, reason },
            DataError::Persistence { path, reason } => PipelineError::Persistence { path, reason },
            DataError::InvalidArtifact { path, reason } => {
                PipelineError::InvalidArtifact { path, reason }
            }
        }
    }
}

impl From<MlError> for PipelineError {
    fn from(e: MlError) -> Self {
        match e {
            MlError::InsufficientSamples {
                class,
                count,
                required,
            } => PipelineError::InsufficientSamples {
                class,
                count,
                required,
            },
            MlError::InvalidParameter(msg) => PipelineError::InvalidParameter(msg),
            other => PipelineError::Model(other),
        }
    }
}
