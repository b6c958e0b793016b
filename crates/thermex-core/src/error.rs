use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid thermal sequence: {0}")]
    InvalidContainer(String),

    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    #[error(
        "Thermal sequence supports {found} measurement unit(s); three are required to build RGB frames"
    )]
    NotEnoughUnits { found: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unit streams disagree on frame count: {counts:?}")]
    FrameCountMismatch { counts: [usize; 3] },

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Cannot compare {expected}-bit frame with {found}-bit frame")]
    PixelDepthMismatch { expected: u8, found: u8 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Video decode error: {0}")]
    VideoDecode(String),

    #[error("Failed to encode frame {index}: {source}")]
    Codec {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write {name}: {source}")]
    Sink {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction cancelled")]
    Cancelled,
}

/// Coarse grouping of [`ExtractError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any frame I/O.
    Config,
    Io,
    /// Streams or frames that do not line up.
    Consistency,
    Codec,
    Cancelled,
}

impl ExtractError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotEnoughUnits { .. }
            | Self::InvalidConfig(_)
            | Self::UnsupportedContainer(_) => ErrorCategory::Config,
            Self::Io(_)
            | Self::Open { .. }
            | Self::InvalidContainer(_)
            | Self::VideoDecode(_)
            | Self::Sink { .. } => ErrorCategory::Io,
            Self::FrameCountMismatch { .. }
            | Self::ShapeMismatch { .. }
            | Self::PixelDepthMismatch { .. }
            | Self::FrameIndexOutOfRange { .. } => ErrorCategory::Consistency,
            Self::Codec { .. } => ErrorCategory::Codec,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
