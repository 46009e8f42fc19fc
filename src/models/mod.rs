pub mod layout;
pub mod stats;

pub use layout::{Delimiter, SourceFormat, SourceLayout};
pub use stats::{ConsolidationStats, ExtractionStats};

/// One row of string fields, identified only by its position in the file
pub type Row = Vec<String>;
