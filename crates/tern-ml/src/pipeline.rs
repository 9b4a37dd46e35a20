//! Ordered composition of stages.
//!
//! A [`Pipeline`] is unfitted. Fitting it produces an independent
//! [`PipelineModel`] in which every estimator has been replaced by the
//! transformer it produced. The pipeline itself is never mutated, so fitting
//! twice yields two unrelated models.

use std::any::Any;
use std::sync::Arc;

use datafusion::arrow::datatypes::Schema;
use log::info;
use tern_data::Dataset;

use crate::error::{MlError, MlResult};
use crate::stage::{Estimator, PipelineStage, Transformer};

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(stages: Vec<PipelineStage>) -> Self {
        Self { stages }
    }

    pub fn with_stage(mut self, stage: PipelineStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Fits the estimators in order.
    ///
    /// The whole chain is validated against the input schema before any
    /// stage runs. Each estimator is fitted on the output of the stages
    /// before it. Stages after the last estimator are not applied to the
    /// training data.
    pub fn fit(&self, dataset: &Dataset) -> MlResult<PipelineModel> {
        Estimator::transform_schema(self, &dataset.schema())?;
        let last_estimator = self.stages.iter().rposition(PipelineStage::is_estimator);
        let mut current = dataset.clone();
        let mut fitted: Vec<Arc<dyn Transformer>> = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            let transformer = match stage {
                PipelineStage::Transformer(t) => Arc::clone(t),
                PipelineStage::Estimator(e) => {
                    info!(
                        "fitting stage {index} ({}) on {} rows",
                        e.name(),
                        current.num_rows()
                    );
                    e.fit_stage(&current)
                        .map_err(|err| MlError::stage(index, e.name(), err))?
                }
            };
            if last_estimator.is_some_and(|last| index < last) {
                current = transformer
                    .transform(&current)
                    .map_err(|err| MlError::stage(index, transformer.name(), err))?;
            }
            fitted.push(transformer);
        }
        Ok(PipelineModel::new(fitted))
    }
}

impl Estimator for Pipeline {
    fn name(&self) -> &str {
        "Pipeline"
    }

    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema> {
        self.stages
            .iter()
            .enumerate()
            .try_fold(schema.clone(), |schema, (index, stage)| {
                stage
                    .transform_schema(&schema)
                    .map_err(|err| MlError::stage(index, stage.name(), err))
            })
    }

    fn fit_stage(&self, dataset: &Dataset) -> MlResult<Arc<dyn Transformer>> {
        Ok(Arc::new(self.fit(dataset)?))
    }
}

/// A fitted pipeline made of transformers only.
#[derive(Debug, Clone)]
pub struct PipelineModel {
    stages: Vec<Arc<dyn Transformer>>,
}

impl PipelineModel {
    pub fn new(stages: Vec<Arc<dyn Transformer>>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Arc<dyn Transformer>] {
        &self.stages
    }

    /// Returns the first stage of type `T`.
    pub fn find_stage<T: Transformer + 'static>(&self) -> Option<&T> {
        self.stages
            .iter()
            .find_map(|stage| stage.as_any().downcast_ref::<T>())
    }
}

impl Transformer for PipelineModel {
    fn name(&self) -> &str {
        "PipelineModel"
    }

    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema> {
        self.stages
            .iter()
            .enumerate()
            .try_fold(schema.clone(), |schema, (index, stage)| {
                stage
                    .transform_schema(&schema)
                    .map_err(|err| MlError::stage(index, stage.name(), err))
            })
    }

    fn transform(&self, dataset: &Dataset) -> MlResult<Dataset> {
        Transformer::transform_schema(self, &dataset.schema())?;
        self.stages
            .iter()
            .enumerate()
            .try_fold(dataset.clone(), |current, (index, stage)| {
                stage
                    .transform(&current)
                    .map_err(|err| MlError::stage(index, stage.name(), err))
            })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
