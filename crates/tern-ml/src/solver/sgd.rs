//! Gradient descent solver.
//!
//! Runs full-batch gradient descent on scaled features and label. With an
//! intercept each column is centered and divided by its standard deviation;
//! without one it is only divided by its root mean square. Writing
//! `z_j = (x_j - shift_j) / s_j` and `t = (y - shift) / s_y`, the loss
//! `(1/n) * ||y - Xb - c||^2 + reg * ||b||^2` on the original scale becomes
//! `s_y^2 * ((1/n) * ||t - Zw||^2 + sum_j (reg / s_j^2) * w_j^2)` with
//! `b_j = w_j * s_y / s_j`, so both solvers minimize the same objective.
//! The L2 term is applied as a proximal step, which stays stable for any
//! penalty weight.

use log::{debug, info};

use crate::error::{MlError, MlResult};
use crate::solver::{column_means, Solution};

/// SGD training parameters.
#[derive(Debug, Clone)]
pub struct SGDParams {
    pub max_iter: usize,
    pub learning_rate: f64,
    pub tolerance: f64,
    pub fit_intercept: bool,
    pub reg_param: f64,
}

impl Default for SGDParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            learning_rate: 0.1,
            tolerance: 1e-6,
            fit_intercept: true,
            reg_param: 0.0,
        }
    }
}

/// Train using gradient descent.
pub fn solve_sgd(features: &[Vec<f64>], labels: &[f64], params: &SGDParams) -> MlResult<Solution> {
    let n = labels.len();
    if n == 0 {
        return Err(MlError::invalid("no training instances"));
    }
    let num_features = features.first().map(|x| x.len()).unwrap_or(0);
    let x_shift = if params.fit_intercept {
        column_means(features, num_features)
    } else {
        vec![0.0; num_features]
    };
    let x_scale = x_shift
        .iter()
        .enumerate()
        .map(|(j, m)| root_mean_square(features.iter().map(|x| x[j] - m)))
        .collect::<Vec<_>>();
    let y_shift = if params.fit_intercept {
        labels.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };
    let y_scale = root_mean_square(labels.iter().map(|y| y - y_shift));
    let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

    // All-zero columns after shifting keep a zero coefficient.
    let standardized = features
        .iter()
        .map(|x| {
            x.iter()
                .zip(&x_shift)
                .zip(&x_scale)
                .map(|((v, m), s)| if *s > 0.0 { (v - m) / s } else { 0.0 })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let targets = labels
        .iter()
        .map(|y| (y - y_shift) / y_scale)
        .collect::<Vec<_>>();
    let penalties = x_scale
        .iter()
        .map(|s| if *s > 0.0 { params.reg_param / (s * s) } else { 0.0 })
        .collect::<Vec<_>>();

    let mut beta = vec![0.0; num_features];
    let mut objective_history = Vec::new();
    let mut prev_loss = f64::MAX;
    let mut iterations = 0;
    let scale = 2.0 / n as f64;

    for epoch in 0..params.max_iter {
        iterations = epoch + 1;
        let mut gradient = vec![0.0; num_features];
        let mut loss_sum = 0.0;

        for (z, &t) in standardized.iter().zip(&targets) {
            let prediction = z.iter().zip(&beta).map(|(zi, bi)| zi * bi).sum::<f64>();
            let error = prediction - t;
            loss_sum += error * error;
            for (g, zj) in gradient.iter_mut().zip(z) {
                *g += error * zj;
            }
        }

        let penalty = beta
            .iter()
            .zip(&penalties)
            .map(|(b, r)| r * b * b)
            .sum::<f64>();
        let loss = loss_sum / n as f64 + penalty;
        for ((b, g), r) in beta.iter_mut().zip(&gradient).zip(&penalties) {
            *b = (*b - params.learning_rate * scale * g)
                / (1.0 + 2.0 * params.learning_rate * r);
        }
        objective_history.push(loss);

        debug!("Epoch {epoch}: loss={loss:.6}, coefficients={beta:?}");

        if !loss.is_finite() {
            return Err(MlError::invalid_data(format!(
                "gradient descent diverged at epoch {epoch}; try a smaller learning rate"
            )));
        }
        if (prev_loss - loss).abs() < params.tolerance {
            info!("Converged at epoch {epoch} with loss {loss:.6}");
            break;
        }
        prev_loss = loss;
    }

    let coefficients = beta
        .iter()
        .zip(&x_scale)
        .map(|(b, s)| if *s > 0.0 { b * y_scale / s } else { 0.0 })
        .collect::<Vec<_>>();
    let intercept = if params.fit_intercept {
        y_shift
            - coefficients
                .iter()
                .zip(&x_shift)
                .map(|(c, m)| c * m)
                .sum::<f64>()
    } else {
        0.0
    };

    Ok(Solution {
        coefficients,
        intercept,
        iterations,
        objective_history,
    })
}

fn root_mean_square(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len().max(1) as f64;
    (values.map(|v| v * v).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::solver::ols::solve_ols;

    fn precise() -> SGDParams {
        SGDParams {
            max_iter: 10000,
            learning_rate: 0.1,
            tolerance: 1e-14,
            ..Default::default()
        }
    }

    /// Runs every iteration, for comparisons against the closed form.
    fn exhaustive() -> SGDParams {
        SGDParams {
            max_iter: 20000,
            learning_rate: 0.1,
            tolerance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_sgd_simple() {
        // y = 1*x1 + 2*x2
        let features = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let labels = vec![1.0, 2.0, 3.0];

        let params = SGDParams {
            fit_intercept: false,
            ..precise()
        };
        let solution = solve_sgd(&features, &labels, &params).unwrap();

        assert!((solution.coefficients[0] - 1.0).abs() < 0.01);
        assert!((solution.coefficients[1] - 2.0).abs() < 0.01);
        assert_eq!(solution.intercept, 0.0);
    }

    #[test]
    fn test_sgd_with_intercept_on_unscaled_data() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![100.0, 150.0, 250.0];
        let solution = solve_sgd(&features, &labels, &precise()).unwrap();
        assert!((solution.coefficients[0] - 75.0).abs() < 0.01);
        assert!((solution.intercept - 50.0 / 3.0).abs() < 0.01);
        assert!(solution.iterations > 1);
        assert_eq!(solution.iterations, solution.objective_history.len());
    }

    #[test]
    fn test_sgd_loss_decreases() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let labels = vec![3.0, 5.5, 6.5, 9.0];
        let solution = solve_sgd(&features, &labels, &SGDParams::default()).unwrap();
        let history = &solution.objective_history;
        assert!(history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_sgd_constant_feature() {
        let features = vec![vec![2.0], vec![2.0], vec![2.0]];
        let labels = vec![1.0, 2.0, 3.0];
        let solution = solve_sgd(&features, &labels, &precise()).unwrap();
        assert_eq!(solution.coefficients, vec![0.0]);
        assert!((solution.intercept - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sgd_constant_feature_without_intercept() {
        let features = vec![vec![2.0], vec![2.0], vec![2.0]];
        let labels = vec![1.0, 2.0, 3.0];
        let params = SGDParams {
            fit_intercept: false,
            ..exhaustive()
        };
        let solution = solve_sgd(&features, &labels, &params).unwrap();
        let exact = solve_ols(&features, &labels, false, 0.0).unwrap();
        assert!((exact.coefficients[0] - 1.0).abs() < 1e-12);
        assert!((solution.coefficients[0] - exact.coefficients[0]).abs() < 1e-6);
        assert_eq!(solution.intercept, 0.0);
    }

    #[test]
    fn test_sgd_matches_ridge_normal_equations() {
        let features = vec![
            vec![1.0, 0.5],
            vec![2.0, 3.0],
            vec![3.0, 1.0],
            vec![4.0, 2.5],
        ];
        let labels = vec![100.0, 150.0, 250.0, 280.0];
        for (fit_intercept, reg_param) in [(true, 1.0), (true, 0.3), (false, 2.0)] {
            let params = SGDParams {
                fit_intercept,
                reg_param,
                ..exhaustive()
            };
            let solution = solve_sgd(&features, &labels, &params).unwrap();
            let exact = solve_ols(&features, &labels, fit_intercept, reg_param).unwrap();
            for (a, b) in solution.coefficients.iter().zip(&exact.coefficients) {
                assert!((a - b).abs() < 1e-6, "{a} != {b} (reg {reg_param})");
            }
            assert!((solution.intercept - exact.intercept).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sgd_large_penalty_is_stable() {
        let features = vec![vec![0.01], vec![0.02], vec![0.03]];
        let labels = vec![1.0, 2.0, 3.0];
        let params = SGDParams {
            reg_param: 1000.0,
            ..exhaustive()
        };
        let solution = solve_sgd(&features, &labels, &params).unwrap();
        let exact = solve_ols(&features, &labels, true, 1000.0).unwrap();
        assert!((solution.coefficients[0] - exact.coefficients[0]).abs() < 1e-9);
    }

    #[test]
    fn test_sgd_divergence() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![1.0, 2.0, 3.0];
        let params = SGDParams {
            learning_rate: 100.0,
            max_iter: 1000,
            ..Default::default()
        };
        let result = solve_sgd(&features, &labels, &params);
        assert!(matches!(result, Err(MlError::InvalidData(_))));
    }

    #[test]
    fn test_sgd_empty() {
        let result = solve_sgd(&[], &[], &SGDParams::default());
        assert!(matches!(result, Err(MlError::InvalidArgument(_))));
    }
}
