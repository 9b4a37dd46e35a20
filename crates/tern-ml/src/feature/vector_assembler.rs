//! Combines several columns into a single feature vector column.

use std::any::Any;

use datafusion::arrow::array::{Array, BooleanArray, Float64Array};
use datafusion::arrow::datatypes::{Field, Schema};
use log::debug;
use tern_common::config::InvalidHandling;
use tern_data::Dataset;

use crate::column::{
    append_field, build_vector_array, float64_column, is_numeric, vector_data_type, vector_size,
    VectorColumn,
};
use crate::error::{MlError, MlResult};
use crate::stage::Transformer;

/// How the assembler treats null (and, when skipping, NaN) input values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandleInvalid {
    /// Fail on the first null input value.
    #[default]
    Error,
    /// Drop rows with a null or NaN input value.
    Skip,
    /// Emit NaN for null input values.
    Keep,
}

impl From<InvalidHandling> for HandleInvalid {
    fn from(value: InvalidHandling) -> Self {
        match value {
            InvalidHandling::Error => HandleInvalid::Error,
            InvalidHandling::Skip => HandleInvalid::Skip,
            InvalidHandling::Keep => HandleInvalid::Keep,
        }
    }
}

/// Concatenates the input columns, in order, into one vector per row.
///
/// Numeric and boolean columns contribute one element each and vector
/// columns contribute all of their elements.
#[derive(Debug, Clone)]
pub struct VectorAssembler {
    input_columns: Vec<String>,
    output_column: String,
    handle_invalid: HandleInvalid,
}

enum Input {
    Scalar(Float64Array),
    Vector(VectorColumn),
}

impl Input {
    fn width(&self) -> usize {
        match self {
            Input::Scalar(_) => 1,
            Input::Vector(v) => v.size(),
        }
    }

    fn is_valid(&self, row: usize) -> bool {
        match self {
            Input::Scalar(a) => a.is_valid(row) && !a.value(row).is_nan(),
            Input::Vector(v) => v.row(row).is_some_and(|x| !x.iter().any(|x| x.is_nan())),
        }
    }
}

impl VectorAssembler {
    pub fn new<S: Into<String>>(
        input_columns: impl IntoIterator<Item = S>,
        output_column: impl Into<String>,
    ) -> Self {
        Self {
            input_columns: input_columns.into_iter().map(Into::into).collect(),
            output_column: output_column.into(),
            handle_invalid: HandleInvalid::default(),
        }
    }

    pub fn with_handle_invalid(mut self, handle_invalid: HandleInvalid) -> Self {
        self.handle_invalid = handle_invalid;
        self
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    pub fn output_column(&self) -> &str {
        &self.output_column
    }

    pub fn handle_invalid(&self) -> HandleInvalid {
        self.handle_invalid
    }

    fn read_inputs(&self, dataset: &Dataset) -> MlResult<Vec<Input>> {
        self.input_columns
            .iter()
            .map(|name| {
                let array = dataset
                    .column(name)
                    .ok_or_else(|| MlError::missing_column(name))?;
                if vector_size(array.data_type()).is_some() {
                    Ok(Input::Vector(VectorColumn::try_new(array, name)?))
                } else {
                    Ok(Input::Scalar(float64_column(array, name)?))
                }
            })
            .collect()
    }

    fn assemble(&self, inputs: &[Input], num_rows: usize) -> MlResult<Vec<f64>> {
        let width = inputs.iter().map(Input::width).sum::<usize>();
        let mut values = Vec::with_capacity(num_rows * width);
        for row in 0..num_rows {
            for (input, name) in inputs.iter().zip(self.input_columns.iter()) {
                let valid = match input {
                    Input::Scalar(array) if array.is_valid(row) => {
                        values.push(array.value(row));
                        true
                    }
                    Input::Scalar(_) => false,
                    Input::Vector(column) => match column.row(row) {
                        Some(x) => {
                            values.extend_from_slice(x);
                            true
                        }
                        None => false,
                    },
                };
                if !valid {
                    if self.handle_invalid == HandleInvalid::Error {
                        return Err(MlError::invalid_data(format!(
                            "null value in column {name} at row {row}; \
                             consider skipping or keeping invalid rows"
                        )));
                    }
                    values.extend(std::iter::repeat_n(f64::NAN, input.width()));
                }
            }
        }
        Ok(values)
    }
}

impl Transformer for VectorAssembler {
    fn name(&self) -> &str {
        "VectorAssembler"
    }

    fn transform_schema(&self, schema: &Schema) -> MlResult<Schema> {
        if self.input_columns.is_empty() {
            return Err(MlError::invalid("vector assembler needs at least one input column"));
        }
        let mut width = 0;
        for name in &self.input_columns {
            let field = schema
                .field_with_name(name)
                .map_err(|_| MlError::missing_column(name))?;
            let data_type = field.data_type();
            if let Some(size) = vector_size(data_type) {
                width += size;
            } else if is_numeric(data_type) {
                width += 1;
            } else {
                return Err(MlError::type_error(format!(
                    "column {name} has non-numeric type {data_type} and no encoding is configured"
                )));
            }
        }
        append_field(
            schema,
            Field::new(&self.output_column, vector_data_type(width)?, true),
        )
    }

    fn transform(&self, dataset: &Dataset) -> MlResult<Dataset> {
        self.transform_schema(&dataset.schema())?;
        let mut inputs = self.read_inputs(dataset)?;
        let mut dataset = dataset.clone();
        if self.handle_invalid == HandleInvalid::Skip {
            let mask = (0..dataset.num_rows())
                .map(|row| inputs.iter().all(|input| input.is_valid(row)))
                .collect::<Vec<_>>();
            let mask = BooleanArray::from(mask);
            if mask.false_count() > 0 {
                debug!(
                    "{} skipped {} rows with invalid values",
                    self.name(),
                    mask.false_count()
                );
                dataset = dataset.filter(&mask)?;
                inputs = self.read_inputs(&dataset)?;
            }
        }
        let width = inputs.iter().map(Input::width).sum::<usize>();
        let values = self.assemble(&inputs, dataset.num_rows())?;
        let array = build_vector_array(values, width, None)?;
        Ok(dataset.with_column(&self.output_column, array)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
