use crate::utils::constants::{PAYMENT_FIELDS, TOLLPLAZA_FIELDS, VEHICLE_FIELDS};
use clap::ValueEnum;
use std::ops::Range;

/// How a raw source line is split into fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Comma,
    Tab,
    /// Runs of whitespace collapse into one separator
    Whitespace,
}

impl Delimiter {
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Comma => line.trim().split(',').collect(),
            Delimiter::Tab => line.trim().split('\t').collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }
}

/// The three raw formats shipped in the toll archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum SourceFormat {
    /// Comma-delimited vehicle data
    Csv,
    /// Tab-delimited toll plaza data
    Tsv,
    /// Whitespace-token fixed-width payment data
    FixedWidth,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::Csv,
        SourceFormat::Tsv,
        SourceFormat::FixedWidth,
    ];

    pub fn layout(&self) -> SourceLayout {
        match self {
            SourceFormat::Csv => SourceLayout::new(Delimiter::Comma, VEHICLE_FIELDS),
            SourceFormat::Tsv => SourceLayout::new(Delimiter::Tab, TOLLPLAZA_FIELDS),
            SourceFormat::FixedWidth => SourceLayout::new(Delimiter::Whitespace, PAYMENT_FIELDS),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "comma-delimited",
            SourceFormat::Tsv => "tab-delimited",
            SourceFormat::FixedWidth => "fixed-width",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Delimiter plus the half-open range of field positions an extractor keeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub delimiter: Delimiter,
    pub fields: Range<usize>,
}

impl SourceLayout {
    pub fn new(delimiter: Delimiter, fields: Range<usize>) -> Self {
        Self { delimiter, fields }
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Project the retained fields out of one raw line.
    ///
    /// Positions past the end of the line are dropped, so a short line
    /// yields a short row instead of an error.
    pub fn project<'a>(&self, line: &'a str) -> Vec<&'a str> {
        self.delimiter
            .split(line)
            .into_iter()
            .skip(self.fields.start)
            .take(self.width())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_projection() {
        let layout = SourceFormat::Csv.layout();
        assert_eq!(layout.project("A1,B2,C3,D4,E5"), vec!["A1", "B2", "C3", "D4"]);
    }

    #[test]
    fn test_tab_projection() {
        let layout = SourceFormat::Tsv.layout();
        assert_eq!(
            layout.project("a\tb\tc\td\tXYZ\tQRS\tTUV\tmore"),
            vec!["XYZ", "QRS", "TUV"]
        );
    }

    #[test]
    fn test_whitespace_projection_collapses_runs() {
        let layout = SourceFormat::FixedWidth.layout();
        let line = "  t0 t1   t2 t3 t4  t5 t6 t7    t8 t9   t10  t11 ";
        assert_eq!(layout.project(line), vec!["t9", "t10"]);
    }

    #[test]
    fn test_short_line_yields_short_row() {
        let layout = SourceFormat::Csv.layout();
        assert_eq!(layout.project("only,two"), vec!["only", "two"]);

        let layout = SourceFormat::Tsv.layout();
        assert!(layout.project("a\tb\tc").is_empty());
    }

    #[test]
    fn test_layout_widths() {
        let widths: Vec<usize> = SourceFormat::ALL.iter().map(|f| f.layout().width()).collect();
        assert_eq!(widths, vec![4, 3, 2]);
    }
}
