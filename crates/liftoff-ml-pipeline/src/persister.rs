use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::CandidateRecord;
use crate::registry::TrainedModel;
use crate::selector::SelectionDecision;
use liftoff_ml_core::{Labels, Matrix};
use liftoff_ml_io::{load_json, read_feature_rows, stage_file, stage_json};
use liftoff_ml_preprocessing::ScalingTransform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where a run leaves its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub artifact: PathBuf,
    pub metrics: PathBuf,
}

/// Everything needed to score new rows: the winning model, the scaler it was
/// trained behind, and the feature columns in the order both expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedArtifact {
    pub model: TrainedModel,
    pub scaler: ScalingTransform,
    pub columns: Vec<String>,
}

impl PersistedArtifact {
    /// Scale raw feature rows and predict.
    pub fn predict(&self, raw: &Matrix) -> PipelineResult<Labels> {
        if raw.cols() != self.columns.len() {
            return Err(PipelineError::Schema {
                column: "*".into(),
                reason: format!(
                    "expected {} feature columns, got {}",
                    self.columns.len(),
                    raw.cols()
                ),
            });
        }
        let scaled = self.scaler.apply(raw)?;
        Ok(self.model.as_classifier().predict(&scaled)?)
    }

    /// Score every row of a clean CSV, matching columns by name.
    pub fn predict_csv(&self, path: &Path) -> PipelineResult<Labels> {
        let raw = read_feature_rows(path, &self.columns)?;
        self.predict(&raw)
    }
}

/// Load and sanity-check an artifact written by [`persist`].
pub fn load_artifact(path: &Path) -> PipelineResult<PersistedArtifact> {
    let artifact: PersistedArtifact = load_json(path)?;
    let invalid = |reason: String| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };
    artifact.scaler.validate().map_err(|e| invalid(e.to_string()))?;
    if artifact.scaler.n_features() != artifact.columns.len() {
        return Err(invalid(format!(
            "scaler has {} factors for {} columns",
            artifact.scaler.n_features(),
            artifact.columns.len()
        )));
    }
    Ok(artifact)
}

/// Plain-text report: one block per candidate in registry order, then the winner.
pub struct MetricsDocument<'a> {
    pub records: &'a [CandidateRecord],
    pub selection: &'a SelectionDecision,
}

impl fmt::Display for MetricsDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self.records {
            writeln!(f, "== {} ==", record.name)?;
            match &record.outcome {
                Ok(scored) => {
                    writeln!(f, "accuracy: {:.4}", scored.evaluation.accuracy)?;
                    writeln!(f, "{}", scored.evaluation.report)?;
                }
                Err(e) => {
                    writeln!(f, "FAILED: {e}")?;
                    writeln!(f)?;
                }
            }
        }
        writeln!(f, "BEST: {}", self.selection.name)
    }
}

pub fn render_metrics(records: &[CandidateRecord], selection: &SelectionDecision) -> String {
    MetricsDocument { records, selection }.to_string()
}

/// Write the artifact and the metrics document.
///
/// Both are staged to temporary files before anything is renamed, and the
/// artifact is renamed last, so a failure at any step leaves the previous
/// artifact in place.
pub fn persist(
    artifact: &PersistedArtifact,
    metrics: &str,
    paths: &OutputPaths,
) -> PipelineResult<()> {
    let staged_artifact = stage_json(artifact, &paths.artifact)?;
    let staged_metrics = stage_file(&paths.metrics, metrics.as_bytes())?;
    staged_metrics.commit()?;
    staged_artifact.commit()?;
    info!(
        artifact = %paths.artifact.display(),
        metrics = %paths.metrics.display(),
        "saved outputs"
    );
    Ok(())
}
