pub mod config;
mod orchestrator;
mod selector;
mod types;

pub use orchestrator::Extractor;
pub use selector::FrameSelector;
pub use types::{
    CancellationToken, ExtractionState, ExtractionSummary, ProgressReporter,
};
