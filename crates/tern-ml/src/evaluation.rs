//! Regression quality metrics.

use datafusion::arrow::array::Array;
use tern_data::Dataset;

use crate::column::float64_column;
use crate::error::{MlError, MlResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegressionMetric {
    /// Root mean squared error.
    #[default]
    Rmse,
    /// Mean squared error.
    Mse,
    /// Mean absolute error.
    Mae,
    /// Coefficient of determination.
    R2,
}

/// Summary statistics of the residuals `label - prediction`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionMetrics {
    pub count: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// `1 - SS_res / SS_tot`. NaN or negative infinity when all labels are
    /// equal, as the total sum of squares is zero.
    pub r2: f64,
}

impl RegressionMetrics {
    /// Computes the metrics over `(label, prediction)` pairs.
    pub fn compute(pairs: impl IntoIterator<Item = (f64, f64)>) -> MlResult<Self> {
        let pairs = pairs.into_iter().collect::<Vec<_>>();
        if pairs.is_empty() {
            return Err(MlError::invalid("cannot evaluate an empty set of predictions"));
        }
        let n = pairs.len() as f64;
        let label_mean = pairs.iter().map(|(y, _)| y).sum::<f64>() / n;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut abs_sum = 0.0;
        for (y, p) in &pairs {
            let residual = y - p;
            ss_res += residual * residual;
            ss_tot += (y - label_mean) * (y - label_mean);
            abs_sum += residual.abs();
        }
        let mse = ss_res / n;
        Ok(Self {
            count: pairs.len(),
            mse,
            rmse: mse.sqrt(),
            mae: abs_sum / n,
            r2: 1.0 - ss_res / ss_tot,
        })
    }

    pub fn get(&self, metric: RegressionMetric) -> f64 {
        match metric {
            RegressionMetric::Rmse => self.rmse,
            RegressionMetric::Mse => self.mse,
            RegressionMetric::Mae => self.mae,
            RegressionMetric::R2 => self.r2,
        }
    }
}

/// Scores a dataset that holds both a label and a prediction column.
#[derive(Debug, Clone)]
pub struct RegressionEvaluator {
    label_column: String,
    prediction_column: String,
    metric: RegressionMetric,
}

impl Default for RegressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionEvaluator {
    pub fn new() -> Self {
        Self {
            label_column: "label".to_string(),
            prediction_column: "prediction".to_string(),
            metric: RegressionMetric::default(),
        }
    }

    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = name.into();
        self
    }

    pub fn with_prediction_column(mut self, name: impl Into<String>) -> Self {
        self.prediction_column = name.into();
        self
    }

    pub fn with_metric(mut self, metric: RegressionMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn metric(&self) -> RegressionMetric {
        self.metric
    }

    /// Whether a larger value of the configured metric means a better model.
    pub fn is_larger_better(&self) -> bool {
        self.metric == RegressionMetric::R2
    }

    /// Rows where either the label or the prediction is null are ignored.
    pub fn metrics(&self, dataset: &Dataset) -> MlResult<RegressionMetrics> {
        let labels = dataset
            .column(&self.label_column)
            .ok_or_else(|| MlError::missing_column(&self.label_column))?;
        let labels = float64_column(labels, &self.label_column)?;
        let predictions = dataset
            .column(&self.prediction_column)
            .ok_or_else(|| MlError::missing_column(&self.prediction_column))?;
        let predictions = float64_column(predictions, &self.prediction_column)?;
        let pairs = (0..dataset.num_rows())
            .filter(|i| labels.is_valid(*i) && predictions.is_valid(*i))
            .map(|i| (labels.value(i), predictions.value(i)));
        RegressionMetrics::compute(pairs)
    }

    pub fn evaluate(&self, dataset: &Dataset) -> MlResult<f64> {
        Ok(self.metrics(dataset)?.get(self.metric))
    }
}
