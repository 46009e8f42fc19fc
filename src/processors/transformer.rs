use crate::error::{ProcessingError, Result};
use crate::models::Row;
use crate::utils::constants::UPPERCASE_FIELD_INDEX;
use crate::utils::AtomicOutput;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::Path;
use tracing::info;

/// Uppercases one column of every row
pub struct Transformer {
    field_index: usize,
}

impl Transformer {
    pub fn new() -> Self {
        Self {
            field_index: UPPERCASE_FIELD_INDEX,
        }
    }

    pub fn with_field_index(field_index: usize) -> Self {
        Self { field_index }
    }

    /// Apply the transformation to a single row; `row_number` is 1-based
    /// and only used for error reporting
    pub fn transform_row(&self, record: &StringRecord, row_number: usize) -> Result<Row> {
        if record.len() <= self.field_index {
            return Err(ProcessingError::FieldOutOfRange {
                row: row_number,
                index: self.field_index,
                width: record.len(),
            });
        }

        Ok(record
            .iter()
            .enumerate()
            .map(|(i, field)| {
                if i == self.field_index {
                    field.to_uppercase()
                } else {
                    field.to_string()
                }
            })
            .collect())
    }

    /// Transform every row of `input` into `output`. No row is treated as
    /// a header. Returns the number of rows written.
    pub fn transform_file(&self, input: &Path, output: &Path) -> Result<usize> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(input)?;
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_writer(AtomicOutput::create(output)?);

        let mut rows = 0;
        for record_result in reader.records() {
            let record = record_result?;
            rows += 1;
            writer.write_record(self.transform_row(&record, rows)?)?;
        }

        let output_file = writer.into_inner().map_err(|e| e.into_error())?;
        output_file.commit()?;

        info!(
            "Transformed {} rows from {} into {} (field {} uppercased)",
            rows,
            input.display(),
            output.display(),
            self.field_index
        );
        Ok(rows)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}
