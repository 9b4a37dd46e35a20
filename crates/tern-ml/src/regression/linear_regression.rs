//! Linear Regression estimator.

use std::sync::Arc;

use datafusion::arrow::array::Array;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use log::{info, warn};
use tern_common::config::RegressionConfig;
use tern_data::Dataset;

use crate::column::{append_field, float64_column, is_numeric, vector_size, VectorColumn};
use crate::error::{MlError, MlResult};
use crate::evaluation::RegressionMetrics;
use crate::regression::{LinearRegressionModel, TrainingSummary};
use crate::solver::{ols, sgd, Solution, Solver};
use crate::stage::{Estimator, Transformer};

/// Linear Regression estimator.
///
/// Supports multiple solvers:
/// - Normal equations - exact closed-form solution
/// - SGD - iterative gradient descent
///
/// # Example
///
/// ```ignore
/// let lr = LinearRegression::new()
///     .with_label_column("price")
///     .with_solver(Solver::Normal);
///
/// let model = lr.fit(&dataset)?;
/// ```
#[derive(Debug, Clone)]
pub struct LinearRegression {
    features_column: String,
    label_column: String,
    prediction_column: String,
    solver: Solver,
    max_iter: usize,
    learning_rate: f64,
    tolerance: f64,
    fit_intercept: bool,
    reg_param: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new LinearRegression estimator with default parameters.
    pub fn new() -> Self {
        Self {
            features_column: "features".to_string(),
            label_column: "label".to_string(),
            prediction_column: "prediction".to_string(),
            solver: Solver::Auto,
            max_iter: 100,
            learning_rate: 0.1,
            tolerance: 1e-6,
            fit_intercept: true,
            reg_param: 0.0,
        }
    }

    pub fn with_features_column(mut self, name: impl Into<String>) -> Self {
        self.features_column = name.into();
        self
    }

    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = name.into();
        self
    }

    pub fn with_prediction_column(mut self, name: impl Into<String>) -> Self {
        self.prediction_column = name.into();
        self
    }

    /// Set the solver type.
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Set maximum iterations (for SGD).
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate (for SGD).
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set whether to fit an intercept term.
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Set regularization parameter (L2).
    pub fn with_reg_param(mut self, reg_param: f64) -> Self {
        self.reg_param = reg_param;
        self
    }

    pub fn features_column(&self) -> &str {
        &self.features_column
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn prediction_column(&self) -> &str {
        &self.prediction_column
    }

    fn validate_params(&self) -> MlResult<()> {
        if self.max_iter == 0 {
            return Err(MlError::invalid("max_iter must be positive"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(MlError::invalid(format!(
                "learning rate must be positive: {}",
                self.learning_rate
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(MlError::invalid(format!(
                "tolerance must be non-negative: {}",
                self.tolerance
            )));
        }
        if !(self.reg_param.is_finite() && self.reg_param >= 0.0) {
            return Err(MlError::invalid(format!(
                "regularization parameter must be non-negative: {}",
                self.reg_param
            )));
        }
        Ok(())
    }

    /// Reads the training rows. Null, NaN and infinite values are rejected.
    fn training_data(&self, dataset: &Dataset) -> MlResult<(Vec<Vec<f64>>, Vec<f64>)> {
        let features = VectorColumn::try_new(
            dataset.require_column(&self.features_column)?,
            &self.features_column,
        )?;
        let labels = float64_column(
            dataset.require_column(&self.label_column)?,
            &self.label_column,
        )?;
        let mut x = Vec::with_capacity(features.len());
        let mut y = Vec::with_capacity(labels.len());
        for i in 0..features.len() {
            let row = features.row(i).ok_or_else(|| {
                MlError::invalid_data(format!(
                    "null value in column {} at row {i}",
                    self.features_column
                ))
            })?;
            if !row.iter().all(|v| v.is_finite()) {
                return Err(MlError::invalid_data(format!(
                    "non-finite value in column {} at row {i}: {row:?}",
                    self.features_column
                )));
            }
            if labels.is_null(i) {
                return Err(MlError::invalid_data(format!(
                    "null value in column {} at row {i}",
                    self.label_column
                )));
            }
            let label = labels.value(i);
            if !label.is_finite() {
                return Err(MlError::invalid_data(format!(
                    "non-finite value in column {} at row {i}: {label}",
                    self.label_column
                )));
            }
            x.push(row.to_vec());
            y.push(label);
        }
        Ok((x, y))
    }

    fn solve(&self, features: &[Vec<f64>], labels: &[f64]) -> MlResult<Solution> {
        let num_features = features.first().map(|x| x.len()).unwrap_or(0);
        let sgd_params = sgd::SGDParams {
            max_iter: self.max_iter,
            learning_rate: self.learning_rate,
            tolerance: self.tolerance,
            fit_intercept: self.fit_intercept,
            reg_param: self.reg_param,
        };
        match self.solver.effective(num_features) {
            Solver::Normal | Solver::Auto => {
                info!("Using normal equation solver (exact solution)");
                match ols::solve_ols(features, labels, self.fit_intercept, self.reg_param) {
                    Err(MlError::InvalidData(e)) if self.solver == Solver::Auto => {
                        warn!("{e}; falling back to the SGD solver");
                        sgd::solve_sgd(features, labels, &sgd_params)
                    }
                    other => other,
                }
            }
            Solver::Sgd => {
                info!("Using SGD solver (iterative)");
                sgd::solve_sgd(features, labels, &sgd_params)
            }
        }
    }

    /// Train the model on the given data.
    pub fn fit(&self, dataset: &Dataset) -> MlResult<LinearRegressionModel> {
        self.validate_params()?;
        self.transform_schema(&dataset.schema())?;
        let (features, labels) = self.training_data(dataset)?;
        if labels.is_empty() {
            return Err(MlError::invalid("no training instances"));
        }
        let solution = self.solve(&features, &labels)?;
        let model = LinearRegressionModel::new(solution.coefficients, solution.intercept)
            .with_features_column(&self.features_column)
            .with_prediction_column(&self.prediction_column);
        let predictions = model.predict_batch(&features);
        let metrics = RegressionMetrics::compute(labels.iter().copied().zip(predictions))?;
        info!(
            "Fitted linear regression on {} instances: \
             coefficients={:?}, intercept={}, rmse={:.6}, r2={:.6}",
            metrics.count,
            model.coefficients(),
            model.intercept(),
            metrics.rmse,
            metrics.r2
        );
        let summary =
            TrainingSummary::new(solution.iterations, solution.objective_history, metrics);
        Ok(model.with_summary(summary))
    }
}

impl From<&RegressionConfig> for LinearRegression {
    fn from(config: &RegressionConfig) -> Self {
        LinearRegression::new()
            .with_label_column(&config.label_column)
            .with_prediction_column(&config.prediction_column)
            .with_solver(config.solver.into())
            .with_max_iter(config.max_iter)
            .with_learning_rate(config.learning_rate)
            .with_tolerance(config.tolerance)
            .with_fit_intercept(config.fit_intercept)
            .with_reg_param(config.reg_param)
    }
}

impl Estimator for LinearRegression {
    fn name(&self) -> &str {
        "LinearRegression"
    }

    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema> {
        let features = schema.field_with_name(&self.features_column).map_err(|_| {
            MlError::schema(format!("features column not found: {}", self.features_column))
        })?;
        if vector_size(features.data_type()).is_none() {
            return Err(MlError::schema(format!(
                "features column {} must be a feature vector, found {}",
                self.features_column,
                features.data_type()
            )));
        }
        let label = schema.field_with_name(&self.label_column).map_err(|_| {
            MlError::schema(format!("label column not found: {}", self.label_column))
        })?;
        if !is_numeric(label.data_type()) {
            return Err(MlError::schema(format!(
                "label column {} must be numeric, found {}",
                self.label_column,
                label.data_type()
            )));
        }
        append_field(
            schema,
            Field::new(&self.prediction_column, DataType::Float64, true),
        )
    }

    fn fit_stage(&self, dataset: &Dataset) -> MlResult<Arc<dyn Transformer>> {
        Ok(Arc::new(self.fit(dataset)?))
    }
}
