//! Machine learning stages over [`tern_data::Dataset`].
//!
//! Stages come in two kinds. A [`Transformer`] maps a dataset to a derived
//! dataset, and an [`Estimator`] learns from a dataset and produces a
//! transformer. A [`Pipeline`] chains both kinds and fits into a
//! [`PipelineModel`] made of transformers only.

pub mod column;
pub mod error;
pub mod evaluation;
pub mod feature;
pub mod pipeline;
pub mod regression;
pub mod solver;
pub mod stage;

pub use evaluation::{RegressionEvaluator, RegressionMetric, RegressionMetrics};
pub use feature::{HandleInvalid, VectorAssembler};
pub use pipeline::{Pipeline, PipelineModel};
pub use regression::{LinearRegression, LinearRegressionModel, TrainingSummary};
pub use solver::Solver;
pub use stage::{Estimator, PipelineStage, Transformer};
