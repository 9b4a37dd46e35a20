//! The end-to-end regression workflow.
//!
//! Load, split, assemble and fit on the training rows, then apply the fitted
//! pipeline to the held-out rows and score the predictions.

use log::info;
use tern_common::config::AppConfig;
use tern_data::{load_dataset, train_test_split, Dataset, LoadOptions, Session};
use tern_ml::{
    LinearRegression, LinearRegressionModel, Pipeline, PipelineModel, PipelineStage,
    RegressionEvaluator, RegressionMetrics, Transformer, VectorAssembler,
};

use crate::error::{WorkflowError, WorkflowResult, WorkflowStep};

/// The outcome of one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Metrics on the training rows.
    pub training_metrics: Option<RegressionMetrics>,
    /// Metrics on the test rows, absent when the test subset is empty.
    pub test_metrics: Option<RegressionMetrics>,
    pub model: PipelineModel,
    /// The test rows with the feature and prediction columns appended.
    pub predictions: Dataset,
}

impl WorkflowReport {
    /// Renders the first `rows` predictions restricted to `columns`.
    pub fn display<S: AsRef<str>>(&self, columns: &[S], rows: usize) -> WorkflowResult<String> {
        let view = if columns.is_empty() {
            self.predictions.clone()
        } else {
            self.predictions
                .select(columns)
                .map_err(WorkflowError::data(WorkflowStep::Inspect))?
        };
        view.to_pretty_string(rows)
            .map_err(WorkflowError::data(WorkflowStep::Inspect))
    }
}

/// Assembler followed by the regression estimator, as configured.
pub fn build_pipeline(config: &AppConfig) -> Pipeline {
    let assembler = VectorAssembler::new(
        config.features.input_columns.iter().cloned(),
        config.features.output_column.clone(),
    )
    .with_handle_invalid(config.features.handle_invalid.into());
    let regression = LinearRegression::from(&config.regression)
        .with_features_column(config.features.output_column.clone());
    Pipeline::new(vec![
        PipelineStage::transformer(assembler),
        PipelineStage::estimator(regression),
    ])
}

fn split_weights(config: &AppConfig) -> WorkflowResult<[f64; 2]> {
    match config.split.weights.as_slice() {
        [train, test] => Ok([*train, *test]),
        other => Err(WorkflowError::invalid(format!(
            "expected a training and a test weight, got {other:?}"
        ))),
    }
}

/// Runs everything after loading on an in-memory dataset.
pub fn fit_and_apply(dataset: &Dataset, config: &AppConfig) -> WorkflowResult<WorkflowReport> {
    let weights = split_weights(config)?;
    let (train, test) = train_test_split(dataset, weights, config.split.seed)
        .map_err(WorkflowError::data(WorkflowStep::Split))?;
    info!(
        "split {} rows into {} training and {} test rows (seed {})",
        dataset.num_rows(),
        train.num_rows(),
        test.num_rows(),
        config.split.seed
    );

    let model = build_pipeline(config)
        .fit(&train)
        .map_err(WorkflowError::ml(WorkflowStep::Fit))?;
    let regression = model
        .find_stage::<LinearRegressionModel>()
        .ok_or_else(|| WorkflowError::internal("the fitted pipeline has no regression model"))?;
    let coefficients = regression.coefficients().to_vec();
    let intercept = regression.intercept();
    let training_metrics = regression.summary().map(|s| s.metrics().clone());

    let predictions = model
        .transform(&test)
        .map_err(WorkflowError::ml(WorkflowStep::Apply))?;
    let test_metrics = if predictions.num_rows() > 0 {
        let evaluator = RegressionEvaluator::new()
            .with_label_column(config.regression.label_column.clone())
            .with_prediction_column(config.regression.prediction_column.clone());
        let metrics = evaluator
            .metrics(&predictions)
            .map_err(WorkflowError::ml(WorkflowStep::Evaluate))?;
        info!(
            "test metrics: rmse={:.4}, mae={:.4}, r2={:.4}",
            metrics.rmse, metrics.mae, metrics.r2
        );
        Some(metrics)
    } else {
        None
    };

    Ok(WorkflowReport {
        train_rows: train.num_rows(),
        test_rows: test.num_rows(),
        coefficients,
        intercept,
        training_metrics,
        test_metrics,
        model,
        predictions,
    })
}

/// Loads the configured input through `session` and runs the workflow.
pub async fn run_workflow(session: &Session, config: &AppConfig) -> WorkflowResult<WorkflowReport> {
    let dataset = load_dataset(session, &config.data.path, &LoadOptions::from(&config.data))
        .await
        .map_err(WorkflowError::data(WorkflowStep::Load))?;
    fit_and_apply(&dataset, config)
}
