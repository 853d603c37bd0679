use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::Matrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scale-only feature transform: every column is divided by its standard
/// deviation over the rows it was fitted on.
///
/// No mean is subtracted, so 0/1 indicator columns stay 0 at zero. A fitted
/// transform is immutable; the same factors are applied to training rows,
/// test rows and any later inference input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingTransform {
    scale: Vec<f64>,
}

impl ScalingTransform {
    /// Compute one factor per column (population standard deviation).
    /// Constant columns get a factor of 1.
    pub fn fit(x: &Matrix) -> MlResult<Self> {
        if x.is_empty() {
            return Err(MlError::Empty);
        }
        if let Some((row, col)) = x.find_non_finite() {
            return Err(MlError::NonFinite { row, col });
        }

        let n = x.rows() as f64;
        let mut scale = Vec::with_capacity(x.cols());
        for j in 0..x.cols() {
            let col = x.column(j)?;
            let mean = col.iter().sum::<f64>() / n;
            let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            let std = var.sqrt();
            scale.push(if std < f64::EPSILON { 1.0 } else { std });
        }

        debug!(?scale, rows = x.rows(), "fitted scaling transform");
        Ok(ScalingTransform { scale })
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn n_features(&self) -> usize {
        self.scale.len()
    }

    /// Scale any number of rows with the fitted factors.
    pub fn apply(&self, x: &Matrix) -> MlResult<Matrix> {
        x.divide_columns(&self.scale)
    }

    /// Factors must be finite and strictly positive; checked after loading from disk.
    pub fn validate(&self) -> MlResult<()> {
        match self.scale.iter().position(|s| !(s.is_finite() && *s > 0.0)) {
            Some(col) => Err(MlError::InvalidParameter(format!(
                "scale factor for column {col} is {}",
                self.scale[col]
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fit_uses_population_std() {
        let x = Matrix::from_rows(&[
            vec![1.0, 0.0, 7.0],
            vec![3.0, 1.0, 7.0],
            vec![5.0, 1.0, 7.0],
            vec![7.0, 0.0, 7.0],
        ])
        .unwrap();
        let t = ScalingTransform::fit(&x).unwrap();

        assert_abs_diff_eq!(t.scale()[0], 5.0f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(t.scale()[1], 0.5, epsilon = 1e-12);
        // Constant column passes through unchanged.
        assert_eq!(t.scale()[2], 1.0);
    }

    #[test]
    fn test_apply_does_not_center() {
        let x = Matrix::from_rows(&[vec![0.0, 2.0], vec![1.0, 4.0], vec![0.0, 6.0]]).unwrap();
        let t = ScalingTransform::fit(&x).unwrap();
        let scaled = t.apply(&x).unwrap();

        // Zeros stay zero and the sign of every cell is kept.
        assert_eq!(scaled.get(0, 0).unwrap(), 0.0);
        assert!(scaled.data().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_apply_single_row_matches_batch() {
        let x = Matrix::from_rows(&[vec![2.0, 10.0], vec![4.0, 30.0], vec![9.0, 20.0]]).unwrap();
        let t = ScalingTransform::fit(&x).unwrap();
        let batch = t.apply(&x).unwrap();
        let single = t.apply(&x.select_rows(&[1]).unwrap()).unwrap();
        assert_eq!(single.row(0), batch.row(1));
    }

    #[test]
    fn test_apply_rejects_wrong_width() {
        let x = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 5.0]]).unwrap();
        let t = ScalingTransform::fit(&x).unwrap();
        let narrow = Matrix::from_rows(&[vec![1.0]]).unwrap();
        assert!(matches!(t.apply(&narrow), Err(MlError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_fit_rejects_empty_and_nan() {
        assert_eq!(ScalingTransform::fit(&Matrix::zeros(0, 3)), Err(MlError::Empty));
        let x = Matrix::from_rows(&[vec![f64::NAN]]).unwrap();
        assert!(matches!(ScalingTransform::fit(&x), Err(MlError::NonFinite { .. })));
    }

    #[test]
    fn test_validate() {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        assert!(ScalingTransform::fit(&x).unwrap().validate().is_ok());
        let bad = ScalingTransform { scale: vec![0.0] };
        assert!(bad.validate().is_err());
    }
}
