use datafusion::arrow::array::RecordBatch;
use datafusion::prelude::{SessionConfig, SessionContext};
use tern_common::config;

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};

/// The handle to the query engine that scans input files.
///
/// Every read goes through an explicit session so that callers control
/// the engine configuration and no global state is involved.
#[derive(Clone)]
pub struct Session {
    context: SessionContext,
}

impl Session {
    pub fn try_new(config: &config::SessionConfig) -> DataResult<Self> {
        if config.batch_size == 0 {
            return Err(DataError::invalid("session batch size must be positive"));
        }
        if config.target_partitions == 0 {
            return Err(DataError::invalid(
                "session target partitions must be positive",
            ));
        }
        let options = SessionConfig::new()
            .with_batch_size(config.batch_size)
            .with_target_partitions(config.target_partitions);
        Ok(Self {
            context: SessionContext::new_with_config(options),
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Builds a dataset from in-memory batches that share one schema.
    pub async fn create_dataset(&self, batches: Vec<RecordBatch>) -> DataResult<Dataset> {
        let Some(schema) = batches.first().map(|b| b.schema()) else {
            return Err(DataError::invalid("at least one record batch is required"));
        };
        let frame = self.context.read_batches(batches)?;
        let batches = frame.collect().await?;
        Dataset::try_from_batches(schema, &batches)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            context: SessionContext::new(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.context.session_id())
            .finish()
    }
}
