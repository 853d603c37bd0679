use liftoff_ml_core::Classifier;
use liftoff_ml_linear::LogisticRegression;
use liftoff_ml_neighbors::KNNClassifier;
use liftoff_ml_svm::SVC;
use liftoff_ml_tree::DecisionTreeClassifier;
use serde::{Deserialize, Serialize};

/// Seed for every seeded candidate internal.
pub const CANDIDATE_SEED: u64 = 42;

/// Any model the pipeline can train, tagged by `kind` when serialized so a
/// saved artifact says what it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    Svc(SVC),
    Knn(KNNClassifier),
    DecisionTree(DecisionTreeClassifier),
}

impl TrainedModel {
    pub fn as_classifier(&self) -> &dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::Svc(m) => m,
            TrainedModel::Knn(m) => m,
            TrainedModel::DecisionTree(m) => m,
        }
    }

    pub fn as_classifier_mut(&mut self) -> &mut dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::Svc(m) => m,
            TrainedModel::Knn(m) => m,
            TrainedModel::DecisionTree(m) => m,
        }
    }
}

/// A named, untrained candidate with fixed hyperparameters.
#[derive(Debug, Clone)]
pub struct CandidateSpec {
    pub name: String,
    pub model: TrainedModel,
}

impl CandidateSpec {
    pub fn new(name: impl Into<String>, model: TrainedModel) -> Self {
        CandidateSpec {
            name: name.into(),
            model,
        }
    }
}

/// The five candidates, in the order used to break accuracy ties.
pub fn default_registry() -> Vec<CandidateSpec> {
    vec![
        CandidateSpec::new(
            "logreg",
            TrainedModel::LogisticRegression(LogisticRegression::new(1.0, 1000)),
        ),
        CandidateSpec::new("svm_linear", TrainedModel::Svc(SVC::linear())),
        CandidateSpec::new("svm_rbf", TrainedModel::Svc(SVC::rbf())),
        CandidateSpec::new(
            "knn",
            TrainedModel::Knn(KNNClassifier::new(5)),
        ),
        CandidateSpec::new(
            "dtree",
            TrainedModel::DecisionTree(DecisionTreeClassifier::new(None, 2, 1, CANDIDATE_SEED)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let names: Vec<String> = default_registry().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["logreg", "svm_linear", "svm_rbf", "knn", "dtree"]);
    }

    #[test]
    fn test_kind_tag() {
        let registry = default_registry();
        let candidate = &registry[3];
        let json = serde_json::to_value(&candidate.model).unwrap();
        assert_eq!(json["kind"], "knn");
        assert_eq!(json["k"], 5);
        assert_eq!(candidate.model.as_classifier().name(), "k_nearest_neighbors");
    }
}
