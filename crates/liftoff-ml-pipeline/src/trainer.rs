use crate::error::{PipelineError, PipelineResult};
use crate::registry::{CandidateSpec, TrainedModel};
use liftoff_ml_core::{Labels, Matrix};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Result of fitting one registry entry.
#[derive(Debug)]
pub struct TrainedCandidate {
    /// Position in the registry.
    pub index: usize,
    pub name: String,
    pub outcome: PipelineResult<TrainedModel>,
}

fn train_one(index: usize, candidate: &CandidateSpec, x: &Matrix, y: &Labels) -> TrainedCandidate {
    debug!(candidate = %candidate.name, "training");
    let mut model = candidate.model.clone();
    let outcome = match model.as_classifier_mut().fit(x, y) {
        Ok(()) => Ok(model),
        Err(e) => {
            warn!(candidate = %candidate.name, error = %e, "candidate failed to train");
            Err(PipelineError::candidate(&candidate.name, e))
        }
    };
    TrainedCandidate {
        index,
        name: candidate.name.clone(),
        outcome,
    }
}

/// Fit a fresh copy of every candidate on the same training set.
///
/// Results come back in registry order whether or not training ran in
/// parallel. A failing candidate yields an `Err` outcome and does not affect
/// the others.
pub fn train_all(
    registry: &[CandidateSpec],
    x: &Matrix,
    y: &Labels,
    parallel: bool,
) -> Vec<TrainedCandidate> {
    if parallel {
        registry
            .par_iter()
            .enumerate()
            .map(|(i, candidate)| train_one(i, candidate, x, y))
            .collect()
    } else {
        registry
            .iter()
            .enumerate()
            .map(|(i, candidate)| train_one(i, candidate, x, y))
            .collect()
    }
}
