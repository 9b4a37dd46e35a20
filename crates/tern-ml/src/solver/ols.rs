//! Closed-form least squares via the normal equations.
//!
//! Minimizes `(1/n) * ||y - Xb - c||^2 + reg * ||b||^2`. With an intercept
//! the data is centered first, so the intercept is never penalized.

use log::debug;

use crate::error::{MlError, MlResult};
use crate::solver::{column_means, Solution};

/// Pivots smaller than this fraction of the largest diagonal entry are
/// treated as zero.
const SINGULARITY_THRESHOLD: f64 = 1e-12;

pub fn solve_ols(
    features: &[Vec<f64>],
    labels: &[f64],
    fit_intercept: bool,
    reg_param: f64,
) -> MlResult<Solution> {
    let n = labels.len();
    let p = features.first().map(|x| x.len()).unwrap_or(0);
    if n == 0 {
        return Err(MlError::invalid("no training instances"));
    }
    let x_mean = if fit_intercept {
        column_means(features, p)
    } else {
        vec![0.0; p]
    };
    let y_mean = if fit_intercept {
        labels.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };

    // Accumulate X^T X and X^T y over the centered data.
    let mut gram = vec![vec![0.0; p]; p];
    let mut moment = vec![0.0; p];
    for (x, y) in features.iter().zip(labels) {
        let y = y - y_mean;
        for i in 0..p {
            let xi = x[i] - x_mean[i];
            moment[i] += xi * y;
            for j in i..p {
                gram[i][j] += xi * (x[j] - x_mean[j]);
            }
        }
    }
    let scale = n as f64;
    for i in 0..p {
        moment[i] /= scale;
        for j in i..p {
            gram[i][j] /= scale;
            gram[j][i] = gram[i][j];
        }
        gram[i][i] += reg_param;
    }

    let coefficients = solve_linear_system(gram, moment)?;
    let intercept = if fit_intercept {
        y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>()
    } else {
        0.0
    };
    debug!("normal equations solved: coefficients={coefficients:?}, intercept={intercept}");
    Ok(Solution {
        coefficients,
        intercept,
        iterations: 0,
        objective_history: vec![],
    })
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> MlResult<Vec<f64>> {
    let p = b.len();
    let max_diagonal = (0..p).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let threshold = SINGULARITY_THRESHOLD * max_diagonal.max(f64::MIN_POSITIVE);
    for col in 0..p {
        let pivot = (col..p)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= threshold {
            return Err(MlError::invalid_data(format!(
                "the normal equations are singular at feature {col}; \
                 the features may be constant or collinear"
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..p {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..p {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; p];
    for row in (0..p).rev() {
        let tail = (row + 1..p).map(|k| a[row][k] * x[k]).sum::<f64>();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
