use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::estimator::{validate_predict_input, validate_training_set};
use liftoff_ml_core::linalg::squared_distance;
use liftoff_ml_core::{Classifier, Labels, Matrix};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// K-Nearest Neighbors Classifier (Euclidean distance).
///
/// Neighbours at equal distance are ordered by training row, and a tied vote
/// goes to the smaller class value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    pub k: usize,
    x_train: Option<Matrix>,
    y_train: Option<Labels>,
}

impl KNNClassifier {
    pub fn new(k: usize) -> Self {
        KNNClassifier {
            k,
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        validate_training_set(x, y)?;
        if self.k == 0 {
            return Err(MlError::InvalidParameter("k must be at least 1".into()));
        }
        if self.k > x.rows() {
            return Err(MlError::InvalidParameter(format!(
                "k = {} exceeds the {} training rows",
                self.k,
                x.rows()
            )));
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    pub fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(MlError::NotFitted),
        };
        validate_predict_input(x, x_train.cols())?;

        let mut predictions = Vec::with_capacity(x.rows());
        for row in x.iter_rows() {
            // Squared distance ranks neighbours the same as Euclidean distance.
            let mut dists: Vec<(f64, usize)> = x_train
                .iter_rows()
                .enumerate()
                .map(|(j, train_row)| (squared_distance(row, train_row), j))
                .collect();

            // Stable on index so equal distances resolve the same way every time.
            dists.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });

            // Majority vote
            let mut votes = [0usize; 2];
            for &(_, idx) in dists.iter().take(self.k) {
                votes[y_train.as_slice()[idx] as usize] += 1;
            }
            predictions.push(u8::from(votes[1] > votes[0]));
        }

        Labels::new(predictions)
    }
}

impl Classifier for KNNClassifier {
    fn name(&self) -> &str {
        "k_nearest_neighbors"
    }

    fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        KNNClassifier::fit(self, x, y)
    }

    fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        KNNClassifier::predict(self, x)
    }
}
