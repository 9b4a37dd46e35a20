//! Solvers for least-squares linear regression.

pub mod ols;
pub mod sgd;

use tern_common::config::SolverKind;

/// Above this many features the normal equations are not attempted.
pub const MAX_NORMAL_FEATURES: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Solver {
    /// Normal equations when feasible, gradient descent otherwise.
    #[default]
    Auto,
    /// Closed-form solution of the normal equations.
    Normal,
    /// Full-batch gradient descent on standardized data.
    Sgd,
}

impl Solver {
    /// Resolves [`Solver::Auto`] for a problem with `num_features` features.
    pub fn effective(&self, num_features: usize) -> Solver {
        match self {
            Solver::Auto if num_features <= MAX_NORMAL_FEATURES => Solver::Normal,
            Solver::Auto => Solver::Sgd,
            other => *other,
        }
    }
}

impl From<SolverKind> for Solver {
    fn from(value: SolverKind) -> Self {
        match value {
            SolverKind::Auto => Solver::Auto,
            SolverKind::Normal => Solver::Normal,
            SolverKind::Sgd => Solver::Sgd,
        }
    }
}

/// The fitted parameters and how they were obtained.
#[derive(Debug, Clone)]
pub struct Solution {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub iterations: usize,
    /// Training loss after each iteration, empty for closed-form solvers.
    pub objective_history: Vec<f64>,
}

/// Per-column means of the feature rows.
pub(crate) fn column_means(features: &[Vec<f64>], num_features: usize) -> Vec<f64> {
    let n = features.len().max(1) as f64;
    let mut mean = vec![0.0; num_features];
    for x in features {
        for (m, v) in mean.iter_mut().zip(x) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_solver() {
        assert_eq!(Solver::Auto.effective(1), Solver::Normal);
        assert_eq!(Solver::Auto.effective(MAX_NORMAL_FEATURES + 1), Solver::Sgd);
        assert_eq!(Solver::Sgd.effective(1), Solver::Sgd);
        assert_eq!(Solver::Normal.effective(10_000), Solver::Normal);
    }

    #[test]
    fn test_column_means() {
        let features = vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]];
        assert_eq!(column_means(&features, 2), vec![2.0, 5.0]);
        assert!(column_means(&[], 2).iter().all(|m| *m == 0.0));
    }
}
