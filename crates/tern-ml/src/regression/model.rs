//! Trained ML models.

use std::any::Any;
use std::sync::Arc;

use datafusion::arrow::array::Float64Array;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use tern_data::Dataset;

use crate::column::{append_field, vector_size, VectorColumn};
use crate::error::{MlError, MlResult};
use crate::regression::TrainingSummary;
use crate::stage::Transformer;

/// A trained linear regression model.
#[derive(Debug, Clone)]
pub struct LinearRegressionModel {
    coefficients: Vec<f64>,
    intercept: f64,
    num_features: usize,
    features_column: String,
    prediction_column: String,
    summary: Option<TrainingSummary>,
}

impl LinearRegressionModel {
    /// Create a new trained model.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        let num_features = coefficients.len();
        Self {
            coefficients,
            intercept,
            num_features,
            features_column: "features".to_string(),
            prediction_column: "prediction".to_string(),
            summary: None,
        }
    }

    pub fn with_features_column(mut self, name: impl Into<String>) -> Self {
        self.features_column = name.into();
        self
    }

    pub fn with_prediction_column(mut self, name: impl Into<String>) -> Self {
        self.prediction_column = name.into();
        self
    }

    pub(crate) fn with_summary(mut self, summary: TrainingSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Get the model coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Get the model intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Get the number of features.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn features_column(&self) -> &str {
        &self.features_column
    }

    pub fn prediction_column(&self) -> &str {
        &self.prediction_column
    }

    /// The training summary, present when the model was produced by fitting.
    pub fn summary(&self) -> Option<&TrainingSummary> {
        self.summary.as_ref()
    }

    /// Predict for a single sample.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut prediction = self.intercept;
        for (coef, feat) in self.coefficients.iter().zip(features.iter()) {
            prediction += coef * feat;
        }
        prediction
    }

    /// Predict for multiple samples.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features.iter().map(|f| self.predict(f)).collect()
    }
}

impl Transformer for LinearRegressionModel {
    fn name(&self) -> &str {
        "LinearRegressionModel"
    }

    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema> {
        let field = schema
            .field_with_name(&self.features_column)
            .map_err(|_| MlError::missing_column(&self.features_column))?;
        match vector_size(field.data_type()) {
            Some(size) if size == self.num_features => {}
            Some(size) => {
                return Err(MlError::schema(format!(
                    "column {} has vectors of size {size} but the model expects {}",
                    self.features_column, self.num_features
                )))
            }
            None => {
                return Err(MlError::schema(format!(
                    "column {} must be a feature vector, found {}",
                    self.features_column,
                    field.data_type()
                )))
            }
        }
        append_field(
            schema,
            Field::new(&self.prediction_column, DataType::Float64, true),
        )
    }

    fn transform(&self, dataset: &Dataset) -> MlResult<Dataset> {
        self.transform_schema(&dataset.schema())?;
        let features = VectorColumn::try_new(
            dataset.require_column(&self.features_column)?,
            &self.features_column,
        )?;
        let predictions = (0..features.len())
            .map(|i| features.row(i).map(|x| self.predict(x)))
            .collect::<Float64Array>();
        Ok(dataset.with_column(&self.prediction_column, Arc::new(predictions))?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
