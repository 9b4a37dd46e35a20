//! An immutable, fully materialized table.

use std::sync::Arc;

use datafusion::arrow::array::{ArrayRef, BooleanArray, RecordBatch};
use datafusion::arrow::compute::{concat_batches, filter_record_batch};
use datafusion::arrow::datatypes::{Field, Schema, SchemaRef};
use datafusion::arrow::util::pretty::pretty_format_batches;

use crate::error::{DataError, DataResult};

/// An ordered collection of rows sharing one schema.
///
/// A dataset is never modified in place. Every operation returns a new
/// dataset that shares the untouched column buffers with its source.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Concatenates the batches into a single dataset with the given schema.
    pub fn try_from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> DataResult<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self { batch })
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            batch: RecordBatch::new_empty(schema),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    pub fn field(&self, name: &str) -> DataResult<&Field> {
        self.batch
            .schema_ref()
            .field_with_name(name)
            .map_err(|_| DataError::missing_column(name))
    }

    pub fn require_column(&self, name: &str) -> DataResult<&ArrayRef> {
        self.column(name)
            .ok_or_else(|| DataError::missing_column(name))
    }

    /// Returns a new dataset with `array` appended as the last column.
    pub fn with_column(&self, name: &str, array: ArrayRef) -> DataResult<Self> {
        if self.column(name).is_some() {
            return Err(DataError::invalid(format!("column already exists: {name}")));
        }
        if array.len() != self.num_rows() {
            return Err(DataError::invalid(format!(
                "column {name} has {} rows but the dataset has {}",
                array.len(),
                self.num_rows()
            )));
        }
        let schema = self.batch.schema_ref();
        let mut fields = schema.fields().iter().cloned().collect::<Vec<_>>();
        fields.push(Arc::new(Field::new(name, array.data_type().clone(), true)));
        let mut columns = self.batch.columns().to_vec();
        columns.push(array);
        let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
        let batch = RecordBatch::try_new(Arc::new(schema), columns)?;
        Ok(Self { batch })
    }

    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> DataResult<Self> {
        let schema = self.batch.schema_ref();
        let indices = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                schema
                    .index_of(name)
                    .map_err(|_| DataError::missing_column(name))
            })
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self {
            batch: self.batch.project(&indices)?,
        })
    }

    /// Keeps the rows where `mask` is true. Null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanArray) -> DataResult<Self> {
        if mask.len() != self.num_rows() {
            return Err(DataError::invalid(format!(
                "filter mask has {} rows but the dataset has {}",
                mask.len(),
                self.num_rows()
            )));
        }
        Ok(Self {
            batch: filter_record_batch(&self.batch, mask)?,
        })
    }

    pub fn limit(&self, n: usize) -> Self {
        Self {
            batch: self.batch.slice(0, n.min(self.num_rows())),
        }
    }

    /// Renders the first `n` rows as a text table.
    pub fn to_pretty_string(&self, n: usize) -> DataResult<String> {
        let head = self.limit(n);
        Ok(pretty_format_batches(&[head.batch])?.to_string())
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}
