//! Ridge regression solved through the normal equations.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Linear model `y = w · x`. Column 0 is the intercept and is not penalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub lambda: f64,
    pub weights: Vec<f64>,
}

impl RidgeRegression {
    /// Fits `(XᵀX + λI′) w = Xᵀy`, where `I′` is the identity with a zero in
    /// the intercept slot. The system is positive definite for any `λ > 0`
    /// and at least one row, even with collinear one-hot blocks.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], lambda: f64) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(PipelineError::Fit("no training rows".into()));
        };
        if rows.len() != targets.len() {
            return Err(PipelineError::Fit(format!(
                "{} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }
        if !(lambda > 0.0 && lambda.is_finite()) {
            return Err(PipelineError::Fit(format!("lambda must be positive, got {lambda}")));
        }

        let d = first.len();
        let mut gram = vec![0.0; d * d];
        let mut rhs = vec![0.0; d];

        for (row, &y) in rows.iter().zip(targets) {
            if row.len() != d {
                return Err(PipelineError::Fit("rows have different widths".into()));
            }
            for i in 0..d {
                let xi = row[i];
                if xi == 0.0 {
                    continue;
                }
                rhs[i] += xi * y;
                for j in 0..=i {
                    gram[i * d + j] += xi * row[j];
                }
            }
        }

        for i in 1..d {
            gram[i * d + i] += lambda;
        }

        let weights = cholesky_solve(&mut gram, rhs, d)
            .ok_or_else(|| PipelineError::Fit("normal equations are not positive definite".into()))?;

        Ok(Self { lambda, weights })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.weights.iter().zip(row).map(|(w, x)| w * x).sum()
    }
}

/// Solves `A x = b` for symmetric positive definite `A`, given its lower
/// triangle in row-major order. `a` is overwritten with the factor `L`.
fn cholesky_solve(a: &mut [f64], mut b: Vec<f64>, d: usize) -> Option<Vec<f64>> {
    for j in 0..d {
        let mut diag = a[j * d + j];
        for k in 0..j {
            diag -= a[j * d + k] * a[j * d + k];
        }
        if !(diag > 0.0 && diag.is_finite()) {
            return None;
        }
        let diag = diag.sqrt();
        a[j * d + j] = diag;

        for i in (j + 1)..d {
            let mut v = a[i * d + j];
            for k in 0..j {
                v -= a[i * d + k] * a[j * d + k];
            }
            a[i * d + j] = v / diag;
        }
    }

    // L z = b
    for i in 0..d {
        let mut v = b[i];
        for k in 0..i {
            v -= a[i * d + k] * b[k];
        }
        b[i] = v / a[i * d + i];
    }
    // Lᵀ x = z
    for i in (0..d).rev() {
        let mut v = b[i];
        for k in (i + 1)..d {
            v -= a[k * d + i] * b[k];
        }
        b[i] = v / a[i * d + i];
    }

    Some(b)
}

/// Mean absolute error, or `None` when there is nothing to compare.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Some(total / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_linear_relation() {
        // y = 3 + 2x with a tiny penalty.
        let rows: Vec<Vec<f64>> = (0..20).map(|x| vec![1.0, x as f64]).collect();
        let targets: Vec<f64> = (0..20).map(|x| 3.0 + 2.0 * x as f64).collect();

        let model = RidgeRegression::fit(&rows, &targets, 1e-9).unwrap();
        assert!((model.weights[0] - 3.0).abs() < 1e-6);
        assert!((model.weights[1] - 2.0).abs() < 1e-6);
        assert!((model.predict(&[1.0, 10.0]) - 23.0).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_one_hot_is_solvable() {
        // Two one-hot columns that always sum to the intercept.
        let rows = vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
        ];
        let targets = vec![10.0, 12.0, 40.0];
        let model = RidgeRegression::fit(&rows, &targets, 1.0).unwrap();

        let a = model.predict(&rows[0]);
        let b = model.predict(&rows[2]);
        assert!(a < b);
        assert!(a > 0.0);
    }

    #[test]
    fn test_single_row_fits() {
        let model = RidgeRegression::fit(&[vec![1.0, 1.0]], &[5.0], 1.0).unwrap();
        assert!((model.predict(&[1.0, 1.0]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(RidgeRegression::fit(&[], &[], 1.0).is_err());
        assert!(RidgeRegression::fit(&[vec![1.0]], &[1.0, 2.0], 1.0).is_err());
        assert!(RidgeRegression::fit(&[vec![1.0]], &[1.0], 0.0).is_err());
    }

    #[test]
    fn test_mean_absolute_error() {
        assert_eq!(mean_absolute_error(&[1.0, 3.0], &[2.0, 1.0]), Some(1.5));
        assert_eq!(mean_absolute_error(&[], &[]), None);
    }
}
