use std::fmt;

use tern_common::error::CommonError;
use tern_data::error::DataError;
use tern_ml::error::MlError;
use tern_telemetry::error::TelemetryError;
use thiserror::Error;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// The steps of the workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Load,
    Split,
    Fit,
    Apply,
    Evaluate,
    Inspect,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStep::Load => "load",
            WorkflowStep::Split => "split",
            WorkflowStep::Fit => "fit",
            WorkflowStep::Apply => "apply",
            WorkflowStep::Evaluate => "evaluate",
            WorkflowStep::Inspect => "inspect",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("configuration error: {0}")]
    CommonError(#[from] CommonError),
    #[error("telemetry error: {0}")]
    TelemetryError(#[from] TelemetryError),
    #[error("{step} step failed: {source}")]
    DataError {
        step: WorkflowStep,
        #[source]
        source: DataError,
    },
    #[error("{step} step failed: {source}")]
    MlError {
        step: WorkflowStep,
        #[source]
        source: MlError,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl WorkflowError {
    pub fn data(step: WorkflowStep) -> impl FnOnce(DataError) -> Self {
        move |source| WorkflowError::DataError { step, source }
    }

    pub fn ml(step: WorkflowStep) -> impl FnOnce(MlError) -> Self {
        move |source| WorkflowError::MlError { step, source }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        WorkflowError::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        WorkflowError::InternalError(message.into())
    }

    /// The step that failed, if the failure happened inside the workflow.
    pub fn step(&self) -> Option<WorkflowStep> {
        match self {
            WorkflowError::DataError { step, .. } | WorkflowError::MlError { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }
}
