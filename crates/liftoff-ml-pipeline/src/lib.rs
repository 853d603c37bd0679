//! Train several classifiers on the clean launch table, keep the best one.
//!
//! Loader → split → scale → train/evaluate each candidate → select → persist.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod persister;
pub mod pipeline;
pub mod registry;
pub mod selector;
pub mod trainer;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use evaluator::{evaluate, EvaluationResult};
pub use persister::{load_artifact, persist, render_metrics, OutputPaths, PersistedArtifact};
pub use pipeline::{prepare, run, run_with_registry, CandidateRecord, Prepared, RunReport, Scored};
pub use registry::{default_registry, CandidateSpec, TrainedModel};
pub use selector::{select, SelectionDecision};
pub use trainer::{train_all, TrainedCandidate};
