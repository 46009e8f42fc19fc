/// Line counts produced by one format extractor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub lines_read: usize,
    /// Lines that had fewer fields than the layout retains
    pub short_lines: usize,
}

impl ExtractionStats {
    pub fn summary(&self) -> String {
        if self.short_lines == 0 {
            format!("{} lines extracted", self.lines_read)
        } else {
            format!(
                "{} lines extracted ({} short)",
                self.lines_read, self.short_lines
            )
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationStats {
    /// Data rows, excluding the header row
    pub rows: usize,
    pub columns: usize,
}

impl ConsolidationStats {
    pub fn summary(&self) -> String {
        format!("{} rows x {} columns", self.rows, self.columns)
    }
}
