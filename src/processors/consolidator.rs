use crate::error::{ProcessingError, Result};
use crate::models::ConsolidationStats;
use crate::utils::AtomicOutput;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One intermediate table held in memory: its first row plus the data rows
struct Table {
    path: PathBuf,
    header: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let header = reader.headers()?.clone();
        if header.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "{} is empty",
                path.display()
            )));
        }

        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            "Read {} rows x {} columns from {}",
            rows.len(),
            header.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            rows,
        })
    }
}

/// Joins intermediate tables side by side, aligned by row position
pub struct Consolidator;

impl Consolidator {
    pub fn new() -> Self {
        Self
    }

    /// Concatenate `inputs` column-wise into `output`.
    ///
    /// The first row of every input is treated as its header and the
    /// concatenated headers become the first output row. Every input must
    /// have the same number of data rows and a constant width; otherwise
    /// nothing is written.
    pub fn consolidate(&self, inputs: &[PathBuf], output: &Path) -> Result<ConsolidationStats> {
        if inputs.is_empty() {
            return Err(ProcessingError::MissingData(
                "no input files to consolidate".to_string(),
            ));
        }

        let tables = inputs
            .iter()
            .map(|p| Table::read(p))
            .collect::<Result<Vec<_>>>()?;

        let expected = tables[0].rows.len();
        if let Some(short) = tables.iter().find(|t| t.rows.len() != expected) {
            return Err(ProcessingError::RowCountMismatch {
                path: short.path.clone(),
                expected,
                found: short.rows.len(),
            });
        }

        let columns: usize = tables.iter().map(|t| t.header.len()).sum();
        let mut writer = WriterBuilder::new().from_writer(AtomicOutput::create(output)?);

        writer.write_record(tables.iter().flat_map(|t| t.header.iter()))?;
        for i in 0..expected {
            writer.write_record(tables.iter().flat_map(|t| t.rows[i].iter()))?;
        }

        let output_file = writer.into_inner().map_err(|e| e.into_error())?;
        output_file.commit()?;

        let stats = ConsolidationStats {
            rows: expected,
            columns,
        };
        info!(
            "Consolidated {} files into {}: {}",
            inputs.len(),
            output.display(),
            stats.summary()
        );
        Ok(stats)
    }
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new()
    }
}
