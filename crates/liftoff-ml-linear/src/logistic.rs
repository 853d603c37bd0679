use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::estimator::{validate_binary_training_set, validate_predict_input};
use liftoff_ml_core::linalg::{cholesky_solve, dot};
use liftoff_ml_core::{Classifier, Labels, Matrix};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Jitter on the unpenalised intercept so the Hessian stays invertible.
const INTERCEPT_RIDGE: f64 = 1e-10;

/// L2-regularised logistic regression, fitted by damped Newton iterations.
///
/// Minimises `mean(log_loss) + ||w||² / (2·C·n)`; the intercept is not
/// penalised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularisation strength.
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    weights: Option<Vec<f64>>,
    bias: f64,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0, 1000)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize) -> Self {
        LogisticRegression {
            c,
            max_iter,
            tol: 1e-6,
            weights: None,
            bias: 0.0,
            n_iter: 0,
        }
    }

    /// Iterations used by the last `fit`.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn objective(&self, x: &Matrix, y: &Labels, w: &[f64], b: f64) -> f64 {
        let n = x.rows() as f64;
        let loss: f64 = x
            .iter_rows()
            .zip(y.iter())
            .map(|(row, yi)| {
                let z = dot(w, row) + b;
                softplus(z) - yi as f64 * z
            })
            .sum();
        loss / n + dot(w, w) / (2.0 * self.c * n)
    }

    pub fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        validate_binary_training_set(x, y)?;
        if !(self.c > 0.0) {
            return Err(MlError::InvalidParameter(format!("C must be positive, got {}", self.c)));
        }

        let n = x.rows();
        let p = x.cols();
        let n_f = n as f64;
        // Parameters are [w_0 .. w_{p-1}, b].
        let dim = p + 1;
        let penalty = 1.0 / (self.c * n_f);

        let mut w = vec![0.0; p];
        let mut b = 0.0;
        let mut converged = false;
        let mut iter = 0;

        while iter < self.max_iter {
            iter += 1;

            let mut grad = vec![0.0; dim];
            let mut hess = vec![0.0; dim * dim];
            for (row, yi) in x.iter_rows().zip(y.iter()) {
                let a = sigmoid(dot(&w, row) + b);
                let err = a - yi as f64;
                let s = a * (1.0 - a);
                for j in 0..dim {
                    let xj = if j < p { row[j] } else { 1.0 };
                    grad[j] += err * xj;
                    for k in 0..=j {
                        let xk = if k < p { row[k] } else { 1.0 };
                        hess[j * dim + k] += s * xj * xk;
                    }
                }
            }
            for j in 0..dim {
                grad[j] /= n_f;
                for k in 0..=j {
                    hess[j * dim + k] /= n_f;
                    hess[k * dim + j] = hess[j * dim + k];
                }
            }
            for j in 0..p {
                grad[j] += penalty * w[j];
                hess[j * dim + j] += penalty;
            }
            hess[p * dim + p] += INTERCEPT_RIDGE;

            if grad.iter().any(|g| !g.is_finite()) {
                return Err(MlError::Numerical(format!(
                    "non-finite gradient at iteration {iter}"
                )));
            }
            let max_grad = grad.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if max_grad < self.tol {
                converged = true;
                break;
            }

            let step = cholesky_solve(&hess, &grad)?;

            // Backtracking line search along the Newton direction.
            let current = self.objective(x, y, &w, b);
            let slope = -dot(&grad, &step);
            let mut t = 1.0;
            loop {
                let w_new: Vec<f64> = w.iter().zip(&step).map(|(wj, sj)| wj - t * sj).collect();
                let b_new = b - t * step[p];
                let candidate = self.objective(x, y, &w_new, b_new);
                if candidate <= current + 1e-4 * t * slope || t < 1e-10 {
                    w = w_new;
                    b = b_new;
                    break;
                }
                t *= 0.5;
            }
        }

        if !converged {
            warn!(
                max_iter = self.max_iter,
                "logistic regression reached its iteration budget without converging"
            );
        }

        self.weights = Some(w);
        self.bias = b;
        self.n_iter = iter;
        Ok(())
    }

    /// Raw margin `w·x + b` per row.
    pub fn decision_function(&self, x: &Matrix) -> MlResult<Vec<f64>> {
        let w = self.weights.as_ref().ok_or(MlError::NotFitted)?;
        validate_predict_input(x, w.len())?;
        Ok(x.iter_rows().map(|row| dot(w, row) + self.bias).collect())
    }

    /// Probability of class 1 per row.
    pub fn predict_proba(&self, x: &Matrix) -> MlResult<Vec<f64>> {
        Ok(self.decision_function(x)?.into_iter().map(sigmoid).collect())
    }

    /// Predict class labels (threshold = 0.5).
    pub fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        let proba = self.predict_proba(x)?;
        Labels::new(proba.iter().map(|&p| u8::from(p >= 0.5)).collect())
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        LogisticRegression::fit(self, x, y)
    }

    fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        LogisticRegression::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn separable() -> (Matrix, Labels) {
        let x = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![1.0, 1.0],
            vec![5.0, 5.0],
            vec![5.5, 5.5],
            vec![6.0, 6.0],
        ])
        .unwrap();
        let y = Labels::new(vec![0, 0, 0, 1, 1, 1]).unwrap();
        (x, y)
    }

    #[test]
    fn test_logistic_regression() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        assert_eq!(pred, y);
        assert!(model.n_iter() < model.max_iter);
    }

    #[test]
    fn test_probabilities_are_ordered() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        for w in proba.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_gradient_vanishes_at_optimum() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let y = Labels::new(vec![0, 1, 0, 1]).unwrap();
        let mut model = LogisticRegression::new(1.0, 100);
        model.fit(&x, &y).unwrap();

        // d/db of the objective is mean(p - y).
        let proba = model.predict_proba(&x).unwrap();
        let mean_residual: f64 =
            proba.iter().zip(y.iter()).map(|(p, yi)| p - yi as f64).sum::<f64>() / 4.0;
        assert_abs_diff_eq!(mean_residual, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_iteration_budget_is_bounded() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(1.0, 1);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_iter(), 1);
        assert!(model.predict(&x).is_ok());
    }

    #[test]
    fn test_errors() {
        let (x, _) = separable();
        let model = LogisticRegression::default();
        assert_eq!(model.predict(&x).unwrap_err(), MlError::NotFitted);

        let mut model = LogisticRegression::default();
        let one_class = Labels::new(vec![1; 6]).unwrap();
        assert_eq!(model.fit(&x, &one_class).unwrap_err(), MlError::SingleClass(1));

        let mut model = LogisticRegression::new(0.0, 10);
        let (x, y) = separable();
        assert!(matches!(model.fit(&x, &y), Err(MlError::InvalidParameter(_))));
    }
}
