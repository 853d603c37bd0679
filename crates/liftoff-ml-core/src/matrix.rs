use crate::error::{MlError, MlResult};

use serde::{Deserialize, Serialize};

/// Dense 2-D matrix of `f64`, one row per launch and one column per feature.
///
/// Stores data in a flat contiguous `Vec<f64>` with row-major layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl Matrix {
    /// Create a matrix from flat row-major data.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> MlResult<Self> {
        if data.len() != rows * cols {
            return Err(MlError::ShapeMismatch {
                expected: vec![rows, cols],
                got: vec![data.len()],
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    /// Create a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Create a matrix from a slice of rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> MlResult<Self> {
        if rows.is_empty() {
            return Ok(Matrix::zeros(0, 0));
        }
        let cols = rows[0].len();
        for row in rows {
            if row.len() != cols {
                return Err(MlError::ShapeMismatch {
                    expected: vec![cols],
                    got: vec![row.len()],
                });
            }
        }
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Matrix::new(data, rows.len(), cols)
    }
}

// ─── Access ─────────────────────────────────────────────────────────────────

impl Matrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> MlResult<f64> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_bounds(row, col));
        }
        Ok(self.data[row * self.cols + col])
    }

    /// Borrow one row. Panics if `row` is out of range, like slice indexing.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, and a zero-column matrix has no meaningful rows anyway
        let width = self.cols.max(1);
        self.data.chunks_exact(width).take(if self.cols == 0 { 0 } else { self.rows })
    }

    /// Copy out one column.
    pub fn column(&self, col: usize) -> MlResult<Vec<f64>> {
        if col >= self.cols {
            return Err(self.out_of_bounds(0, col));
        }
        Ok(self.iter_rows().map(|r| r[col]).collect())
    }

    /// Gather the given rows, in the given order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> MlResult<Matrix> {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            if idx >= self.rows {
                return Err(self.out_of_bounds(idx, 0));
            }
            data.extend_from_slice(self.row(idx));
        }
        Matrix::new(data, indices.len(), self.cols)
    }

    /// Divide every column by its factor.
    pub fn divide_columns(&self, factors: &[f64]) -> MlResult<Matrix> {
        if factors.len() != self.cols {
            return Err(MlError::ShapeMismatch {
                expected: vec![self.cols],
                got: vec![factors.len()],
            });
        }
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(k, &v)| v / factors[k % self.cols])
            .collect();
        Matrix::new(data, self.rows, self.cols)
    }

    /// First non-finite cell, if any.
    pub fn find_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|k| (k / self.cols, k % self.cols))
    }

    /// Population variance of every cell in the matrix.
    pub fn variance_all(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let n = self.data.len() as f64;
        let mean = self.data.iter().sum::<f64>() / n;
        self.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> MlError {
        MlError::IndexOutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_length() {
        assert!(matches!(
            Matrix::new(vec![1.0, 2.0, 3.0], 2, 2),
            Err(MlError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_from_rows_ragged() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, MlError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let m = sample();
        let s = m.select_rows(&[2, 0]).unwrap();
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.row(0), &[5.0, 6.0]);
        assert_eq!(s.row(1), &[1.0, 2.0]);
        assert!(m.select_rows(&[3]).is_err());
    }

    #[test]
    fn test_column_and_get() {
        let m = sample();
        assert_eq!(m.column(1).unwrap(), vec![2.0, 4.0, 6.0]);
        assert_eq!(m.get(1, 0).unwrap(), 3.0);
        assert!(m.get(0, 2).is_err());
    }

    #[test]
    fn test_divide_columns() {
        let m = sample().divide_columns(&[1.0, 2.0]).unwrap();
        assert_eq!(m.row(2), &[5.0, 3.0]);
        assert!(sample().divide_columns(&[1.0]).is_err());
    }

    #[test]
    fn test_find_non_finite() {
        assert_eq!(sample().find_non_finite(), None);
        let m = Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN], 3, 2).unwrap();
        assert_eq!(m.find_non_finite(), Some((2, 1)));
    }

    #[test]
    fn test_iter_rows_counts() {
        assert_eq!(sample().iter_rows().count(), 3);
        assert_eq!(Matrix::zeros(4, 0).iter_rows().count(), 0);
    }

    #[test]
    fn test_variance_all() {
        let m = Matrix::from_rows(&[vec![1.0, 3.0]]).unwrap();
        approx::assert_abs_diff_eq!(m.variance_all(), 1.0, epsilon = 1e-12);
    }
}
