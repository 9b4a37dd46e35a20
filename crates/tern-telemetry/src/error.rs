use log::SetLoggerError;
use thiserror::Error;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to install logger: {0}")]
    SetLoggerError(#[from] SetLoggerError),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl TelemetryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TelemetryError::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        TelemetryError::InternalError(message.into())
    }
}
