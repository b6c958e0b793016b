//! Frame sources over the supported container kinds.

#[cfg(feature = "ffmpeg")]
mod ffmpeg;
pub mod thermal;
pub mod video;

use std::path::Path;

use crate::error::Result;
use crate::frame::{ContainerKind, Frame, SourceInfo};

pub use thermal::{select_units, SeqUnitStream, ThermalSource, UnitStream};
pub use video::{GifStream, VideoSource, VideoStream};

/// An opened input file, chosen once from its extension.
pub enum FrameSource {
    Thermal(ThermalSource),
    Video(VideoSource),
}

impl FrameSource {
    pub fn open(path: &Path) -> Result<Self> {
        match ContainerKind::from_path(path)? {
            ContainerKind::ThermalSequence => Ok(Self::Thermal(ThermalSource::open(path)?)),
            kind => Ok(Self::Video(VideoSource::open(path, kind)?)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Thermal(s) => s.path(),
            Self::Video(s) => s.path(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Thermal(_) => ContainerKind::ThermalSequence,
            Self::Video(s) => s.kind(),
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Self::Thermal(s) => s.frame_count(),
            Self::Video(s) => s.frame_count(),
        }
    }

    /// Index of the frame the next read returns.
    pub fn position(&self) -> usize {
        match self {
            Self::Thermal(s) => s.position(),
            Self::Video(s) => s.position(),
        }
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            Self::Thermal(s) => s.next_frame(),
            Self::Video(s) => s.next_frame(),
        }
    }

    /// Move past the next frame, reading as little as the container allows.
    pub fn skip_frame(&mut self) -> Result<bool> {
        match self {
            Self::Thermal(s) => Ok(s.skip_frame()),
            Self::Video(s) => s.skip_frame(),
        }
    }

    pub fn source_info(&self) -> SourceInfo {
        match self {
            Self::Thermal(s) => s.info().cloned().unwrap_or_else(|| SourceInfo {
                filename: s.path().to_path_buf(),
                kind: ContainerKind::ThermalSequence,
                total_frames: s.frame_count(),
                width: 0,
                height: 0,
                units: s.units().to_vec(),
                calibration: None,
                camera_model: None,
            }),
            Self::Video(s) => s.source_info(),
        }
    }

    /// Release every handle held by the source.
    pub fn close(self) {
        match self {
            Self::Thermal(s) => s.close(),
            Self::Video(s) => s.close(),
        }
    }
}
