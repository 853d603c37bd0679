use crate::error::{MlError, MlResult};
use crate::labels::Labels;
use crate::matrix::Matrix;

/// A binary classifier: the one capability every model candidate exposes.
///
/// Training and evaluation code only ever talks to this trait, so any model
/// can be swapped in without touching them.
pub trait Classifier: Send {
    /// Short stable identifier, used in reports and logs.
    fn name(&self) -> &str;

    fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()>;

    fn predict(&self, x: &Matrix) -> MlResult<Labels>;
}

/// Check a training set before fitting: aligned, non-empty, finite.
pub fn validate_training_set(x: &Matrix, y: &Labels) -> MlResult<()> {
    if x.is_empty() || x.cols() == 0 {
        return Err(MlError::Empty);
    }
    if x.rows() != y.len() {
        return Err(MlError::ShapeMismatch {
            expected: vec![x.rows()],
            got: vec![y.len()],
        });
    }
    if let Some((row, col)) = x.find_non_finite() {
        return Err(MlError::NonFinite { row, col });
    }
    Ok(())
}

/// Like [`validate_training_set`], and also requires both classes to be present.
pub fn validate_binary_training_set(x: &Matrix, y: &Labels) -> MlResult<()> {
    validate_training_set(x, y)?;
    match y.class_counts() {
        [0, _] => Err(MlError::SingleClass(1)),
        [_, 0] => Err(MlError::SingleClass(0)),
        _ => Ok(()),
    }
}

/// Check prediction input against the number of features seen during fit.
pub fn validate_predict_input(x: &Matrix, n_features: usize) -> MlResult<()> {
    if x.cols() != n_features {
        return Err(MlError::ShapeMismatch {
            expected: vec![x.rows(), n_features],
            got: vec![x.rows(), x.cols()],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_training_set() {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let y = Labels::new(vec![0, 1]).unwrap();
        assert!(validate_binary_training_set(&x, &y).is_ok());

        let short = Labels::new(vec![0]).unwrap();
        assert!(matches!(
            validate_training_set(&x, &short),
            Err(MlError::ShapeMismatch { .. })
        ));

        let one_class = Labels::new(vec![1, 1]).unwrap();
        assert_eq!(
            validate_binary_training_set(&x, &one_class),
            Err(MlError::SingleClass(1))
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let x = Matrix::from_rows(&[vec![1.0], vec![f64::INFINITY]]).unwrap();
        let y = Labels::new(vec![0, 1]).unwrap();
        assert_eq!(
            validate_training_set(&x, &y),
            Err(MlError::NonFinite { row: 1, col: 0 })
        );
    }
}
