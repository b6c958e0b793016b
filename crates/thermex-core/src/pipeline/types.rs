use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::frame::ContainerKind;

/// Lifecycle of one extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Opened,
    Iterating,
    Closed,
    Failed,
}

impl std::fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Opened => write!(f, "Opened"),
            Self::Iterating => write!(f, "Iterating"),
            Self::Closed => write!(f, "Closed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Outcome of a successful extraction.
#[derive(Clone, Debug)]
pub struct ExtractionSummary {
    pub source: PathBuf,
    pub kind: ContainerKind,
    /// Frame count reported by the container.
    pub total_frames: usize,
    /// Frames actually traversed.
    pub frames_read: usize,
    /// Indices of retained frames, ascending.
    pub kept: Vec<usize>,
    /// Names handed to the sink, aligned with `kept`.
    pub names: Vec<String>,
    pub state: ExtractionState,
}

/// Thread-safe progress reporting for an extraction.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// Traversal is starting; `total_frames` is best effort.
    fn begin(&self, _total_frames: Option<usize>) {}

    /// `frames_done` frames have been traversed.
    fn advance(&self, _frames_done: usize) {}

    fn finish(&self) {}
}

pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Cooperative cancellation flag, checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
