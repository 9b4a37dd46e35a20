use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use datafusion::arrow::datatypes::Schema;
use tern_data::Dataset;

use crate::error::MlResult;

/// A stage that derives a new dataset from its input without learning.
pub trait Transformer: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Computes the output schema without touching any data.
    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema>;

    fn transform(&self, dataset: &Dataset) -> MlResult<Dataset>;

    fn as_any(&self) -> &dyn Any;
}

/// A stage that learns parameters from a dataset and produces a [`Transformer`].
pub trait Estimator: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Computes the schema that the fitted transformer will produce.
    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema>;

    fn fit_stage(&self, dataset: &Dataset) -> MlResult<Arc<dyn Transformer>>;
}

#[derive(Debug, Clone)]
pub enum PipelineStage {
    Transformer(Arc<dyn Transformer>),
    Estimator(Arc<dyn Estimator>),
}

impl PipelineStage {
    pub fn transformer(transformer: impl Transformer + 'static) -> Self {
        PipelineStage::Transformer(Arc::new(transformer))
    }

    pub fn estimator(estimator: impl Estimator + 'static) -> Self {
        PipelineStage::Estimator(Arc::new(estimator))
    }

    pub fn name(&self) -> &str {
        match self {
            PipelineStage::Transformer(t) => t.name(),
            PipelineStage::Estimator(e) => e.name(),
        }
    }

    pub fn transform_schema(&self, schema: &Schema) -> MlResult<Schema> {
        match self {
            PipelineStage::Transformer(t) => t.transform_schema(schema),
            PipelineStage::Estimator(e) => e.transform_schema(schema),
        }
    }

    pub fn is_estimator(&self) -> bool {
        matches!(self, PipelineStage::Estimator(_))
    }
}
