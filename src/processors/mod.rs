pub mod consolidator;
pub mod pipeline;
pub mod transformer;

pub use consolidator::Consolidator;
pub use pipeline::{Pipeline, PipelineStep, RetryPolicy, RunSummary};
pub use transformer::Transformer;
