use crate::evaluation::RegressionMetrics;

/// Statistics collected while fitting a linear regression model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    num_instances: usize,
    total_iterations: usize,
    objective_history: Vec<f64>,
    metrics: RegressionMetrics,
}

impl TrainingSummary {
    pub fn new(
        total_iterations: usize,
        objective_history: Vec<f64>,
        metrics: RegressionMetrics,
    ) -> Self {
        Self {
            num_instances: metrics.count,
            total_iterations,
            objective_history,
            metrics,
        }
    }

    pub fn num_instances(&self) -> usize {
        self.num_instances
    }

    /// Zero for the closed-form solver.
    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    pub fn objective_history(&self) -> &[f64] {
        &self.objective_history
    }

    /// Metrics of the model on its own training data.
    pub fn metrics(&self) -> &RegressionMetrics {
        &self.metrics
    }

    pub fn root_mean_squared_error(&self) -> f64 {
        self.metrics.rmse
    }

    pub fn mean_squared_error(&self) -> f64 {
        self.metrics.mse
    }

    pub fn mean_absolute_error(&self) -> f64 {
        self.metrics.mae
    }

    pub fn r2(&self) -> f64 {
        self.metrics.r2
    }
}
