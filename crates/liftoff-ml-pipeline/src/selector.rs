use crate::error::{PipelineError, PipelineResult};
use crate::evaluator::EvaluationResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionDecision {
    pub name: String,
    pub index: usize,
    pub accuracy: f64,
}

/// Pick the highest accuracy; equal accuracies go to the earlier registry entry.
pub fn select<'a, I>(results: I) -> PipelineResult<SelectionDecision>
where
    I: IntoIterator<Item = &'a EvaluationResult>,
{
    let mut best: Option<&EvaluationResult> = None;
    for r in results {
        let better = match best {
            None => true,
            Some(b) => r.accuracy > b.accuracy || (r.accuracy == b.accuracy && r.index < b.index),
        };
        if better {
            best = Some(r);
        }
    }
    best.map(|b| SelectionDecision {
        name: b.name.clone(),
        index: b.index,
        accuracy: b.accuracy,
    })
    .ok_or(PipelineError::NoCandidates)
}
