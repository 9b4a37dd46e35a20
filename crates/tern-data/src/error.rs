use datafusion::arrow::error::ArrowError;
use datafusion::common::DataFusionError;
use thiserror::Error;

pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("error in DataFusion: {0}")]
    DataFusionError(#[from] DataFusionError),
    #[error("error in Arrow: {0}")]
    ArrowError(#[from] ArrowError),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl DataError {
    pub fn io(message: impl Into<String>) -> Self {
        DataError::IoError(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DataError::InvalidArgument(message.into())
    }

    pub fn missing_column(name: impl Into<String>) -> Self {
        DataError::MissingColumn(name.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DataError::InternalError(message.into())
    }
}

