use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::estimator::{validate_binary_training_set, validate_predict_input};
use liftoff_ml_core::linalg::{dot, squared_distance};
use liftoff_ml_core::{Classifier, Labels, Matrix};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Alphas below this are treated as zero when collecting support vectors.
const SUPPORT_EPS: f64 = 1e-8;

/// RBF width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, resolved at fit time.
    Scale,
    Value(f64),
}

/// Kernel type for SVM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    Linear,
    Rbf { gamma: Gamma },
}

/// Trained state: only the support vectors are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SupportSet {
    vectors: Matrix,
    /// `alpha_i * y_i` with `y_i` in {-1, +1}.
    dual_coef: Vec<f64>,
    bias: f64,
    /// Resolved RBF gamma (unused by the linear kernel).
    gamma: f64,
}

/// Support Vector Classifier trained with SMO.
///
/// The second multiplier is chosen by the max `|E_i - E_j|` heuristic, with
/// a deterministic scan as fallback, so fits are reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVC {
    pub c: f64,
    pub kernel: Kernel,
    /// Budget of full sweeps over the training set.
    pub max_iter: usize,
    pub tol: f64,
    /// Consecutive sweeps without an update before stopping.
    pub max_passes: usize,
    model: Option<SupportSet>,
}

impl SVC {
    pub fn new(c: f64, kernel: Kernel, max_iter: usize) -> Self {
        SVC {
            c,
            kernel,
            max_iter,
            tol: 1e-3,
            max_passes: 3,
            model: None,
        }
    }

    pub fn linear() -> Self {
        Self::new(1.0, Kernel::Linear, 1000)
    }

    pub fn rbf() -> Self {
        Self::new(1.0, Kernel::Rbf { gamma: Gamma::Scale }, 1000)
    }

    pub fn n_support(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.dual_coef.len())
    }

    /// Gamma actually used by the fitted model.
    pub fn fitted_gamma(&self) -> Option<f64> {
        match (self.kernel, &self.model) {
            (Kernel::Rbf { .. }, Some(m)) => Some(m.gamma),
            _ => None,
        }
    }

    fn resolve_gamma(&self, x: &Matrix) -> MlResult<f64> {
        match self.kernel {
            Kernel::Linear => Ok(0.0),
            Kernel::Rbf { gamma: Gamma::Value(g) } => {
                if g > 0.0 && g.is_finite() {
                    Ok(g)
                } else {
                    Err(MlError::InvalidParameter(format!("gamma must be positive, got {g}")))
                }
            }
            Kernel::Rbf { gamma: Gamma::Scale } => {
                let var = x.variance_all();
                Ok(if var > 0.0 { 1.0 / (x.cols() as f64 * var) } else { 1.0 })
            }
        }
    }

    fn kernel_eval(&self, a: &[f64], b: &[f64], gamma: f64) -> f64 {
        match self.kernel {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { .. } => (-gamma * squared_distance(a, b)).exp(),
        }
    }

    /// Fit using SMO.
    pub fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        validate_binary_training_set(x, y)?;
        if !(self.c > 0.0) {
            return Err(MlError::InvalidParameter(format!("C must be positive, got {}", self.c)));
        }

        let n = x.rows();
        let gamma = self.resolve_gamma(x)?;

        // Convert labels to +1/-1
        let labels: Vec<f64> = y.iter().map(|v| if v == 1 { 1.0 } else { -1.0 }).collect();

        let mut k = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let v = self.kernel_eval(x.row(i), x.row(j), gamma);
                k[i * n + j] = v;
                k[j * n + i] = v;
            }
        }

        let mut solver = Smo {
            k: &k,
            n,
            labels: &labels,
            c: self.c,
            alphas: vec![0.0; n],
            bias: 0.0,
            // E_i = f(x_i) - y_i with f ≡ 0 initially.
            errors: labels.iter().map(|y| -y).collect(),
        };

        let mut passes = 0;
        let mut sweeps = 0;
        while passes < self.max_passes && sweeps < self.max_iter {
            sweeps += 1;
            let mut changed = 0;
            for i in 0..n {
                if solver.violates_kkt(i, self.tol) && solver.optimise(i) {
                    changed += 1;
                }
            }
            if changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        if passes < self.max_passes {
            warn!(
                max_iter = self.max_iter,
                kernel = ?self.kernel,
                "SVC reached its iteration budget without converging"
            );
        }
        if !solver.bias.is_finite() || solver.alphas.iter().any(|a| !a.is_finite()) {
            return Err(MlError::Numerical("SMO produced non-finite multipliers".into()));
        }

        let support: Vec<usize> = (0..n).filter(|&i| solver.alphas[i] > SUPPORT_EPS).collect();
        self.model = Some(SupportSet {
            vectors: x.select_rows(&support)?,
            dual_coef: support.iter().map(|&i| solver.alphas[i] * labels[i]).collect(),
            bias: solver.bias,
            gamma,
        });
        Ok(())
    }

    /// Signed distance-like score per row; positive means class 1.
    pub fn decision_function(&self, x: &Matrix) -> MlResult<Vec<f64>> {
        let model = self.model.as_ref().ok_or(MlError::NotFitted)?;
        validate_predict_input(x, model.vectors.cols())?;
        Ok(x
            .iter_rows()
            .map(|row| {
                model
                    .vectors
                    .iter_rows()
                    .zip(&model.dual_coef)
                    .map(|(sv, coef)| coef * self.kernel_eval(sv, row, model.gamma))
                    .sum::<f64>()
                    + model.bias
            })
            .collect())
    }

    pub fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        let scores = self.decision_function(x)?;
        Labels::new(scores.iter().map(|&f| u8::from(f >= 0.0)).collect())
    }
}

impl Classifier for SVC {
    fn name(&self) -> &str {
        match self.kernel {
            Kernel::Linear => "svc_linear",
            Kernel::Rbf { .. } => "svc_rbf",
        }
    }

    fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        SVC::fit(self, x, y)
    }

    fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        SVC::predict(self, x)
    }
}

/// Working state of one SMO run over a precomputed kernel matrix.
struct Smo<'a> {
    k: &'a [f64],
    n: usize,
    labels: &'a [f64],
    c: f64,
    alphas: Vec<f64>,
    bias: f64,
    errors: Vec<f64>,
}

impl Smo<'_> {
    fn violates_kkt(&self, i: usize, tol: f64) -> bool {
        let r = self.errors[i] * self.labels[i];
        (r < -tol && self.alphas[i] < self.c) || (r > tol && self.alphas[i] > 0.0)
    }

    /// Pick a partner for `i` and take a step; true if the multipliers moved.
    fn optimise(&mut self, i: usize) -> bool {
        let ei = self.errors[i];
        let mut best = None;
        let mut best_gap = -1.0;
        for j in 0..self.n {
            let gap = (ei - self.errors[j]).abs();
            if j != i && gap > best_gap {
                best_gap = gap;
                best = Some(j);
            }
        }
        if let Some(j) = best {
            if self.take_step(i, j) {
                return true;
            }
        }
        let n = self.n;
        (1..n).map(|off| (i + off) % n).any(|j| Some(j) != best && self.take_step(i, j))
    }

    fn take_step(&mut self, i: usize, j: usize) -> bool {
        let n = self.n;
        let (yi, yj) = (self.labels[i], self.labels[j]);
        let (ai_old, aj_old) = (self.alphas[i], self.alphas[j]);
        let (ei, ej) = (self.errors[i], self.errors[j]);

        let (lo, hi) = if yi != yj {
            ((aj_old - ai_old).max(0.0), (self.c + aj_old - ai_old).min(self.c))
        } else {
            ((ai_old + aj_old - self.c).max(0.0), (ai_old + aj_old).min(self.c))
        };
        if hi - lo < 1e-12 {
            return false;
        }

        let kii = self.k[i * n + i];
        let kjj = self.k[j * n + j];
        let kij = self.k[i * n + j];
        let eta = kii + kjj - 2.0 * kij;
        if eta <= 1e-12 {
            return false;
        }

        let aj = (aj_old + yj * (ei - ej) / eta).clamp(lo, hi);
        if (aj - aj_old).abs() < 1e-5 {
            return false;
        }
        let ai = ai_old + yi * yj * (aj_old - aj);

        let di = yi * (ai - ai_old);
        let dj = yj * (aj - aj_old);
        let b1 = self.bias - ei - di * kii - dj * kij;
        let b2 = self.bias - ej - di * kij - dj * kjj;
        let b = if ai > 0.0 && ai < self.c {
            b1
        } else if aj > 0.0 && aj < self.c {
            b2
        } else {
            (b1 + b2) / 2.0
        };

        let db = b - self.bias;
        for t in 0..n {
            self.errors[t] += di * self.k[i * n + t] + dj * self.k[j * n + t] + db;
        }
        self.alphas[i] = ai;
        self.alphas[j] = aj;
        self.bias = b;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn accuracy(pred: &Labels, y: &Labels) -> usize {
        pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count()
    }

    #[test]
    fn test_svc_linear() {
        let x = Matrix::from_rows(&[
            vec![0.0, 0.0], vec![0.5, 0.5], vec![1.0, 1.0],
            vec![5.0, 5.0], vec![5.5, 5.5], vec![6.0, 6.0],
        ]).unwrap();
        let y = Labels::new(vec![0, 0, 0, 1, 1, 1]).unwrap();

        let mut svc = SVC::linear();
        svc.fit(&x, &y).unwrap();
        let pred = svc.predict(&x).unwrap();

        assert_eq!(accuracy(&pred, &y), 6);
        assert!(svc.n_support() >= 2);
    }

    #[test]
    fn test_svc_rbf_separates_middle_band() {
        let x = Matrix::from_rows(&[
            vec![0.0], vec![0.2], vec![4.0], vec![4.2], vec![8.0], vec![8.2],
        ]).unwrap();
        let y = Labels::new(vec![0, 0, 1, 1, 0, 0]).unwrap();

        let mut svc = SVC::new(1.0, Kernel::Rbf { gamma: Gamma::Value(5.0) }, 1000);
        svc.fit(&x, &y).unwrap();
        let pred = svc.predict(&x).unwrap();
        assert!(accuracy(&pred, &y) >= 5, "RBF classified {:?}", pred);
    }

    #[test]
    fn test_gamma_scale() {
        let x = Matrix::from_rows(&[vec![0.0, 2.0], vec![2.0, 0.0]]).unwrap();
        let y = Labels::new(vec![0, 1]).unwrap();
        let mut svc = SVC::rbf();
        svc.fit(&x, &y).unwrap();
        // Var over all cells is 1, two features.
        assert_abs_diff_eq!(svc.fitted_gamma().unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = Matrix::from_rows(&[
            vec![1.0, 3.0], vec![2.0, 1.0], vec![3.0, 4.0], vec![4.0, 2.0],
            vec![5.0, 5.0], vec![6.0, 1.5], vec![7.0, 6.0], vec![8.0, 0.5],
        ]).unwrap();
        let y = Labels::new(vec![0, 0, 1, 0, 1, 0, 1, 1]).unwrap();

        let mut a = SVC::rbf();
        let mut b = SVC::rbf();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.decision_function(&x).unwrap(), b.decision_function(&x).unwrap());
    }

    #[test]
    fn test_not_fitted_and_wrong_width() {
        let svc = SVC::linear();
        let x = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert_eq!(svc.predict(&x).unwrap_err(), MlError::NotFitted);

        let mut svc = SVC::linear();
        let train = Matrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        svc.fit(&train, &Labels::new(vec![0, 1]).unwrap()).unwrap();
        assert!(matches!(svc.predict(&x), Err(MlError::ShapeMismatch { .. })));
    }
}
