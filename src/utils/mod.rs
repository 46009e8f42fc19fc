pub mod constants;
pub mod logging;
pub mod output;
pub mod progress;

pub use constants::*;
pub use logging::init_logging;
pub use output::AtomicOutput;
pub use progress::ProgressReporter;
