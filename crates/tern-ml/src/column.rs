//! Column access helpers shared by the stages.
//!
//! Feature vectors are stored as `FixedSizeList<Float64>` columns, so every
//! row of a vector column has the same length.

use std::sync::Arc;

use datafusion::arrow::array::{Array, ArrayRef, FixedSizeListArray, Float64Array};
use datafusion::arrow::buffer::NullBuffer;
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Field, Schema};

use crate::error::{MlError, MlResult};

const VECTOR_ITEM_NAME: &str = "item";

pub fn vector_data_type(size: usize) -> MlResult<DataType> {
    let size = i32::try_from(size)
        .map_err(|_| MlError::invalid(format!("vector size is too large: {size}")))?;
    Ok(DataType::FixedSizeList(
        Arc::new(Field::new(VECTOR_ITEM_NAME, DataType::Float64, true)),
        size,
    ))
}

/// Returns the vector length if `data_type` is a feature vector type.
pub fn vector_size(data_type: &DataType) -> Option<usize> {
    match data_type {
        DataType::FixedSizeList(field, size) if field.data_type() == &DataType::Float64 => {
            usize::try_from(*size).ok()
        }
        _ => None,
    }
}

/// Whether values of `data_type` can be read as `f64`.
pub fn is_numeric(data_type: &DataType) -> bool {
    data_type.is_numeric() || matches!(data_type, DataType::Boolean | DataType::Null)
}

/// Returns `schema` with `field` appended, failing if the name is taken.
pub fn append_field(schema: &Schema, field: Field) -> MlResult<Schema> {
    if schema.field_with_name(field.name()).is_ok() {
        return Err(MlError::invalid(format!(
            "output column already exists: {}",
            field.name()
        )));
    }
    let mut fields = schema.fields().iter().cloned().collect::<Vec<_>>();
    fields.push(Arc::new(field));
    Ok(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// Reads a numeric column as `Float64`.
pub fn float64_column(array: &ArrayRef, name: &str) -> MlResult<Float64Array> {
    if !is_numeric(array.data_type()) {
        return Err(MlError::type_error(format!(
            "column {name} has non-numeric type {}",
            array.data_type()
        )));
    }
    let array = cast(array, &DataType::Float64)?;
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| MlError::internal(format!("failed to read column {name} as Float64")))
}

/// A read-only view of a feature vector column.
#[derive(Debug, Clone)]
pub struct VectorColumn {
    values: Float64Array,
    size: usize,
    nulls: Option<NullBuffer>,
    len: usize,
}

impl VectorColumn {
    pub fn try_new(array: &ArrayRef, name: &str) -> MlResult<Self> {
        let size = vector_size(array.data_type()).ok_or_else(|| {
            MlError::schema(format!(
                "column {name} must be a feature vector, found {}",
                array.data_type()
            ))
        })?;
        let list = array
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| MlError::internal(format!("column {name} is not a list array")))?;
        let values = list
            .values()
            .as_any()
            .downcast_ref::<Float64Array>()
            .cloned()
            .ok_or_else(|| MlError::internal(format!("column {name} has non-Float64 values")))?;
        Ok(Self {
            values,
            size,
            nulls: list.nulls().cloned(),
            len: list.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the vector of row `i`, or `None` if the row is null.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if self.nulls.as_ref().is_some_and(|n| n.is_null(i)) {
            return None;
        }
        let start = i * self.size;
        Some(&self.values.values()[start..start + self.size])
    }
}

/// Builds a vector column from row-major `values`.
pub fn build_vector_array(
    values: Vec<f64>,
    size: usize,
    validity: Option<Vec<bool>>,
) -> MlResult<ArrayRef> {
    let DataType::FixedSizeList(field, length) = vector_data_type(size)? else {
        return Err(MlError::internal("unexpected vector data type"));
    };
    let nulls = validity.map(NullBuffer::from);
    let array = FixedSizeListArray::try_new(
        field,
        length,
        Arc::new(Float64Array::from(values)),
        nulls,
    )?;
    Ok(Arc::new(array))
}
