//! # liftoff-ml
//!
//! Trains several binary classifiers on a clean table of launch records and
//! keeps the one that best predicts whether the first stage landed.
//!
//! ## Modules
//!
//! - **core**: `Matrix`, `Labels`, the `Classifier` trait, `MlError`
//! - **preprocessing**: stratified train/test split, scale-only transform
//! - **linear**: L2-penalised logistic regression
//! - **svm**: support vector classifier (linear and RBF kernels)
//! - **neighbors**: k-nearest neighbours
//! - **tree**: CART decision tree (Gini)
//! - **metrics**: accuracy, confusion matrix, classification report
//! - **io**: schema-checked CSV loading, atomic JSON and text output
//! - **pipeline**: candidate registry, training, evaluation, selection, persistence

/// Core matrix and label types.
pub use liftoff_ml_core as core;

/// Splitting and scaling.
pub use liftoff_ml_preprocessing as preprocessing;

/// Linear models.
pub use liftoff_ml_linear as linear;

/// Support vector machines.
pub use liftoff_ml_svm as svm;

/// Nearest neighbors.
pub use liftoff_ml_neighbors as neighbors;

/// Tree-based models.
pub use liftoff_ml_tree as tree;

/// Evaluation metrics.
pub use liftoff_ml_metrics as metrics;

/// I/O utilities.
pub use liftoff_ml_io as io;

/// Model selection pipeline.
pub use liftoff_ml_pipeline as pipeline;

pub use liftoff_ml_pipeline::{run, PipelineConfig, PipelineError};
