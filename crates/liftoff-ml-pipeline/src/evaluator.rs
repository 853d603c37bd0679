use crate::error::{PipelineError, PipelineResult};
use liftoff_ml_core::{Classifier, Labels, Matrix};
use liftoff_ml_metrics::ClassificationReport;
use serde::Serialize;

/// How one trained candidate scored on the held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub name: String,
    /// Position in the registry.
    pub index: usize,
    pub accuracy: f64,
    pub report: ClassificationReport,
}

/// Score `model` on the scaled test rows. A prediction failure is reported
/// against the candidate, like a training failure.
pub fn evaluate(
    name: &str,
    index: usize,
    model: &dyn Classifier,
    x_test: &Matrix,
    y_test: &Labels,
) -> PipelineResult<EvaluationResult> {
    let y_pred = model
        .predict(x_test)
        .map_err(|e| PipelineError::candidate(name, e))?;
    let report =
        ClassificationReport::new(y_test, &y_pred).map_err(|e| PipelineError::candidate(name, e))?;
    Ok(EvaluationResult {
        name: name.to_string(),
        index,
        accuracy: report.accuracy,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use liftoff_ml_neighbors::KNNClassifier;

    #[test]
    fn test_evaluate_knn() {
        let x = Matrix::from_rows(&[vec![0.0], vec![0.1], vec![1.0], vec![1.1]]).unwrap();
        let y = Labels::new(vec![0, 0, 1, 1]).unwrap();
        let mut knn = KNNClassifier::new(1);
        knn.fit(&x, &y).unwrap();

        let x_test = Matrix::from_rows(&[vec![0.05], vec![0.9], vec![0.6]]).unwrap();
        let y_test = Labels::new(vec![0, 1, 0]).unwrap();
        let result = evaluate("knn", 3, &knn, &x_test, &y_test).unwrap();

        assert_eq!(result.name, "knn");
        assert_eq!(result.index, 3);
        assert_abs_diff_eq!(result.accuracy, 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(result.report.classes[0].support, 2);
    }

    #[test]
    fn test_unfitted_model_is_candidate_error() {
        let knn = KNNClassifier::new(1);
        let x = Matrix::from_rows(&[vec![0.0]]).unwrap();
        let y = Labels::new(vec![0]).unwrap();
        assert!(matches!(
            evaluate("knn", 0, &knn, &x, &y),
            Err(PipelineError::CandidateTraining { .. })
        ));
    }
}
