use thiserror::Error;

/// Error type shared by every model and preprocessing step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MlError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Index out of bounds: ({row}, {col}) for a {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid label {value} at row {row}: labels must be 0 or 1")]
    InvalidLabel { row: usize, value: f64 },

    #[error("Class {class} has {count} rows, at least {required} are required")]
    InsufficientSamples {
        class: u8,
        count: usize,
        required: usize,
    },

    #[error("Training labels contain a single class ({0})")]
    SingleClass(u8),

    #[error("Non-finite value at ({row}, {col})")]
    NonFinite { row: usize, col: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Model not fitted")]
    NotFitted,

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("Empty input")]
    Empty,
}

pub type MlResult<T> = Result<T, MlError>;
