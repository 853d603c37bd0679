use crate::error::{MlError, MlResult};

/// Dot product of two equally long slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Squared Euclidean distance.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Solve `A x = b` for a symmetric positive definite `A` (flat row-major, n×n)
/// via Cholesky factorisation.
pub fn cholesky_solve(a: &[f64], b: &[f64]) -> MlResult<Vec<f64>> {
    let n = b.len();
    if a.len() != n * n {
        return Err(MlError::ShapeMismatch {
            expected: vec![n, n],
            got: vec![a.len()],
        });
    }

    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[i * n + k] * l[j * n + k];
            }
            if i == j {
                let val = a[i * n + i] - sum;
                if val <= 0.0 || !val.is_finite() {
                    return Err(MlError::NotPositiveDefinite);
                }
                l[i * n + j] = val.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    // Forward substitution: L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[i * n + k] * y[k]).sum();
        y[i] = (b[i] - sum) / l[i * n + i];
    }

    // Back substitution: Lᵀ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[k * n + i] * x[k]).sum();
        x[i] = (y[i] - sum) / l[i * n + i];
    }
    Ok(x)
}
