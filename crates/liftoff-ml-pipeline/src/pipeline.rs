use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::evaluator::{evaluate, EvaluationResult};
use crate::persister::{persist, render_metrics, OutputPaths, PersistedArtifact};
use crate::registry::{default_registry, CandidateSpec, TrainedModel};
use crate::selector::{select, SelectionDecision};
use crate::trainer::train_all;
use liftoff_ml_core::{Labels, Matrix};
use liftoff_ml_io::{read_dataset, LaunchDataset};
use liftoff_ml_preprocessing::{stratified_split, ScalingTransform, Split};
use tracing::{info, warn};

/// Split and scaled partitions for one run.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub split: Split,
    pub scaler: ScalingTransform,
    pub x_train: Matrix,
    pub y_train: Labels,
    pub x_test: Matrix,
    pub y_test: Labels,
}

/// A candidate that trained and was evaluated.
#[derive(Debug, Clone)]
pub struct Scored {
    pub model: TrainedModel,
    pub evaluation: EvaluationResult,
}

/// Per-candidate outcome of a run, in registry order.
#[derive(Debug)]
pub struct CandidateRecord {
    pub index: usize,
    pub name: String,
    pub outcome: PipelineResult<Scored>,
}

#[derive(Debug)]
pub struct RunReport {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub candidates: Vec<CandidateRecord>,
    pub selection: SelectionDecision,
    pub artifact: PersistedArtifact,
    pub paths: OutputPaths,
}

/// Split the dataset and scale both partitions with factors fitted on the
/// training rows alone.
pub fn prepare(dataset: &LaunchDataset, test_fraction: f64, seed: u64) -> PipelineResult<Prepared> {
    let split = stratified_split(&dataset.labels, test_fraction, seed)?;

    let raw_train = dataset.features.select_rows(&split.train)?;
    let raw_test = dataset.features.select_rows(&split.test)?;
    let scaler = ScalingTransform::fit(&raw_train)?;

    Ok(Prepared {
        x_train: scaler.apply(&raw_train)?,
        y_train: dataset.labels.select(&split.train)?,
        x_test: scaler.apply(&raw_test)?,
        y_test: dataset.labels.select(&split.test)?,
        scaler,
        split,
    })
}

/// Load the clean table named by `config` and run the default registry on it.
pub fn run(config: &PipelineConfig) -> PipelineResult<RunReport> {
    config.validate()?;
    let dataset = read_dataset(&config.input_path)?;
    info!(
        features = dataset.n_features(),
        samples = dataset.n_samples(),
        "loaded dataset"
    );
    run_with_registry(&dataset, config, &default_registry())
}

/// Train, evaluate, select and persist for an already loaded dataset.
///
/// Nothing is written unless at least one candidate succeeds.
pub fn run_with_registry(
    dataset: &LaunchDataset,
    config: &PipelineConfig,
    registry: &[CandidateSpec],
) -> PipelineResult<RunReport> {
    config.validate()?;
    let prepared = prepare(dataset, config.test_fraction, config.seed)?;
    info!(
        train = prepared.split.train.len(),
        test = prepared.split.test.len(),
        seed = config.seed,
        "split dataset"
    );

    let trained = train_all(registry, &prepared.x_train, &prepared.y_train, config.parallel);

    let candidates: Vec<CandidateRecord> = trained
        .into_iter()
        .map(|t| {
            let outcome = t.outcome.and_then(|model| {
                let evaluation = evaluate(
                    &t.name,
                    t.index,
                    model.as_classifier(),
                    &prepared.x_test,
                    &prepared.y_test,
                )?;
                Ok(Scored { model, evaluation })
            });
            match &outcome {
                Ok(s) => info!(candidate = %t.name, accuracy = s.evaluation.accuracy, "evaluated"),
                Err(e) => warn!(candidate = %t.name, error = %e, "candidate excluded"),
            }
            CandidateRecord {
                index: t.index,
                name: t.name,
                outcome,
            }
        })
        .collect();

    let selection = select(
        candidates
            .iter()
            .filter_map(|c| c.outcome.as_ref().ok())
            .map(|s| &s.evaluation),
    )?;
    info!(winner = %selection.name, accuracy = selection.accuracy, "selected model");

    let winner = candidates
        .iter()
        .find(|c| c.index == selection.index)
        .and_then(|c| c.outcome.as_ref().ok())
        .map(|s| s.model.clone())
        .ok_or(crate::error::PipelineError::NoCandidates)?;

    let artifact = PersistedArtifact {
        model: winner,
        scaler: prepared.scaler.clone(),
        columns: dataset.columns.clone(),
    };
    let paths = config.output_paths();
    persist(&artifact, &render_metrics(&candidates, &selection), &paths)?;

    Ok(RunReport {
        n_samples: dataset.n_samples(),
        n_features: dataset.n_features(),
        n_train: prepared.split.train.len(),
        n_test: prepared.split.test.len(),
        candidates,
        selection,
        artifact,
        paths,
    })
}
