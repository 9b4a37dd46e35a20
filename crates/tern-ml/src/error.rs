use datafusion::arrow::error::ArrowError;
use tern_data::error::DataError;
use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("stage {index} ({stage}) failed: {source}")]
    StageError {
        index: usize,
        stage: String,
        source: Box<MlError>,
    },
    #[error("{0}")]
    DataError(#[source] DataError),
    #[error("error in Arrow: {0}")]
    ArrowError(#[from] ArrowError),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl MlError {
    pub fn missing_column(name: impl Into<String>) -> Self {
        MlError::MissingColumn(name.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        MlError::SchemaError(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        MlError::TypeError(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        MlError::InvalidArgument(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        MlError::InvalidData(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        MlError::InternalError(message.into())
    }

    pub fn stage(index: usize, stage: impl Into<String>, source: MlError) -> Self {
        MlError::StageError {
            index,
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, looking through pipeline stage context.
    pub fn root(&self) -> &MlError {
        let mut error = self;
        while let MlError::StageError { source, .. } = error {
            error = source;
        }
        error
    }
}

impl From<DataError> for MlError {
    fn from(value: DataError) -> Self {
        match value {
            DataError::MissingColumn(e) => MlError::MissingColumn(e),
            DataError::InvalidArgument(e) => MlError::InvalidArgument(e),
            DataError::ArrowError(e) => MlError::ArrowError(e),
            other => MlError::DataError(other),
        }
    }
}
