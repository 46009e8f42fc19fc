pub mod table_reporter;

pub use table_reporter::{ReportFormat, SampleRow, TableReporter};
