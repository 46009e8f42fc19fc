use crate::error::Result;
use crate::models::{ExtractionStats, SourceFormat, SourceLayout};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use crate::utils::AtomicOutput;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Projects a fixed field subset out of one raw source format
pub struct FieldExtractor {
    layout: SourceLayout,
}

impl FieldExtractor {
    pub fn new(layout: SourceLayout) -> Self {
        Self { layout }
    }

    pub fn for_format(format: SourceFormat) -> Self {
        Self::new(format.layout())
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Turn one raw line into its comma-joined projection
    pub fn extract_line(&self, line: &str) -> String {
        self.layout.project(line).join(",")
    }

    /// Extract every line of `input` into `output`.
    ///
    /// Short lines are written as short rows. The output only appears once
    /// the whole input has been read.
    pub fn extract_file(&self, input: &Path, output: &Path) -> Result<ExtractionStats> {
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, File::open(input)?);
        let mut writer = AtomicOutput::create(output)?;
        let stats = self.extract(reader, &mut writer)?;
        writer.commit()?;

        if stats.short_lines > 0 {
            warn!(
                "{} of {} lines in {} had fewer than {} fields",
                stats.short_lines,
                stats.lines_read,
                input.display(),
                self.layout.fields.end
            );
        }
        info!(
            "Extracted {} -> {}: {}",
            input.display(),
            output.display(),
            stats.summary()
        );

        Ok(stats)
    }

    pub fn extract<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<ExtractionStats> {
        let mut stats = ExtractionStats::default();

        for line_result in reader.lines() {
            let line = line_result?;
            let fields = self.layout.project(&line);

            stats.lines_read += 1;
            if fields.len() < self.layout.width() {
                stats.short_lines += 1;
            }

            writer.write_all(fields.join(",").as_bytes())?;
            writer.write_all(b"\n")?;
        }

        writer.flush()?;
        Ok(stats)
    }
}
