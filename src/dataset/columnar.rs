//! Parquet-backed dataset provider

use super::{DataProvider, Dataset};
use crate::{Error, Result};
use arrow::array::{Array, Float64Array, Int64Array};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::DataType;
use ndarray::{Array1, Array2};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

/// Loads a labeled table from a Parquet file.
///
/// Every column except `label_column` becomes a `Float64` feature, in schema
/// order. The label column is read as a non-negative integer class id.
#[derive(Debug, Clone)]
pub struct ParquetProvider {
    path: PathBuf,
    label_column: String,
}

impl ParquetProvider {
    /// Create a provider for the given file and label column.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, label_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label_column: label_column.into(),
        }
    }
}

impl DataProvider for ParquetProvider {
    fn load(&self) -> Result<Dataset<usize>> {
        let file = File::open(&self.path).map_err(|e| {
            Error::DataLoad(format!(
                "Failed to open Parquet file {}: {e}",
                self.path.display()
            ))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| Error::DataLoad(format!("Failed to parse Parquet file: {e}")))?;
        let schema = builder.schema().clone();

        let reader = builder
            .build()
            .map_err(|e| Error::DataLoad(format!("Failed to create Parquet reader: {e}")))?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch =
                batch.map_err(|e| Error::DataLoad(format!("Failed to read record batch: {e}")))?;
            batches.push(batch);
        }

        let table = concat_batches(&schema, &batches)
            .map_err(|e| Error::DataLoad(format!("Failed to combine record batches: {e}")))?;
        if table.num_rows() == 0 {
            return Err(Error::DataLoad(format!(
                "{} contains no rows",
                self.path.display()
            )));
        }

        let label_index = schema.index_of(&self.label_column).map_err(|_| {
            Error::DataLoad(format!("label column '{}' not found", self.label_column))
        })?;

        let mut columns = Vec::with_capacity(schema.fields().len().saturating_sub(1));
        for (index, field) in schema.fields().iter().enumerate() {
            if index == label_index {
                continue;
            }
            columns.push(float_column(table.column(index).as_ref(), field.name())?);
        }
        if columns.is_empty() {
            return Err(Error::DataLoad("table has no feature columns".to_string()));
        }

        let labels = label_column(table.column(label_index).as_ref(), &self.label_column)?;
        let features = Array2::from_shape_fn((table.num_rows(), columns.len()), |(row, col)| {
            columns[col][row]
        });

        debug!(
            path = %self.path.display(),
            rows = features.nrows(),
            features = features.ncols(),
            "loaded parquet dataset"
        );
        Dataset::new(features, labels)
    }
}

fn float_column(column: &dyn Array, name: &str) -> Result<Vec<f64>> {
    let casted = cast(column, &DataType::Float64)
        .map_err(|e| Error::DataLoad(format!("column '{name}' is not numeric: {e}")))?;
    let values = casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::DataLoad(format!("column '{name}' is not numeric")))?;
    if values.null_count() > 0 {
        return Err(Error::DataLoad(format!("column '{name}' contains nulls")));
    }
    Ok(values.values().to_vec())
}

fn label_column(column: &dyn Array, name: &str) -> Result<Array1<usize>> {
    if column.data_type().is_floating() {
        let values = float_column(column, name)?;
        if let Some(bad) = values.iter().find(|v| v.fract() != 0.0) {
            return Err(Error::DataLoad(format!(
                "label column '{name}' has non-integral class {bad}"
            )));
        }
    }
    let casted = cast(column, &DataType::Int64)
        .map_err(|e| Error::DataLoad(format!("label column '{name}' is not integral: {e}")))?;
    let values = casted
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::DataLoad(format!("label column '{name}' is not integral")))?;
    if values.null_count() > 0 {
        return Err(Error::DataLoad(format!("label column '{name}' contains nulls")));
    }
    values
        .values()
        .iter()
        .map(|&label| {
            usize::try_from(label).map_err(|_| {
                Error::DataLoad(format!("label column '{name}' has negative class {label}"))
            })
        })
        .collect()
}
