use std::path::{Path, PathBuf};

use ndarray::Array3;

use crate::error::{ExtractError, Result};
use crate::io::seq::{Calibration, MeasurementUnit};

/// Pixel data of one extracted frame, shape = (height, width, 3).
#[derive(Clone, Debug, PartialEq)]
pub enum FramePixels {
    /// Decoded video frame.
    Rgb8(Array3<u8>),
    /// Composite of three normalized thermal units.
    Rgb16(Array3<u16>),
}

impl FramePixels {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Rgb8(data) => data.shape(),
            Self::Rgb16(data) => data.shape(),
        }
    }

    pub fn height(&self) -> usize {
        self.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.shape()[1]
    }

    pub fn bit_depth(&self) -> u8 {
        match self {
            Self::Rgb8(_) => 8,
            Self::Rgb16(_) => 16,
        }
    }
}

/// A single frame pulled from a [`FrameSource`](crate::source::FrameSource).
#[derive(Clone, Debug)]
pub struct Frame {
    pub pixels: FramePixels,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(pixels: FramePixels, frame_index: usize) -> Self {
        Self {
            pixels,
            metadata: FrameMetadata {
                frame_index,
                timestamp_us: None,
            },
        }
    }

    pub fn index(&self) -> usize {
        self.metadata.frame_index
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub frame_index: usize,
    pub timestamp_us: Option<u64>,
}

/// Container family, chosen once from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    ThermalSequence,
    Gif,
    /// Anything FFmpeg decodes (mp4, mov, avi, ...).
    Video,
}

impl ContainerKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "seq" => Ok(Self::ThermalSequence),
            "gif" => Ok(Self::Gif),
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" => Ok(Self::Video),
            "" => Err(ExtractError::UnsupportedContainer(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(ExtractError::UnsupportedContainer(format!(
                "unknown extension .{other} ({})",
                path.display()
            ))),
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThermalSequence => write!(f, "Thermal sequence"),
            Self::Gif => write!(f, "GIF animation"),
            Self::Video => write!(f, "Video"),
        }
    }
}

/// Metadata about the source file.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub kind: ContainerKind,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    /// All units the container supports; empty for video.
    pub units: Vec<MeasurementUnit>,
    pub calibration: Option<Calibration>,
    pub camera_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kind_from_extension() {
        assert_eq!(
            ContainerKind::from_path(Path::new("a/b/flight.SEQ")).unwrap(),
            ContainerKind::ThermalSequence
        );
        assert_eq!(
            ContainerKind::from_path(Path::new("clip.gif")).unwrap(),
            ContainerKind::Gif
        );
        assert_eq!(
            ContainerKind::from_path(Path::new("clip.mp4")).unwrap(),
            ContainerKind::Video
        );
    }

    #[test]
    fn test_container_kind_rejects_unknown() {
        assert!(matches!(
            ContainerKind::from_path(Path::new("notes.txt")),
            Err(ExtractError::UnsupportedContainer(_))
        ));
        assert!(ContainerKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_frame_pixels_dimensions() {
        let pixels = FramePixels::Rgb16(Array3::zeros((4, 7, 3)));
        assert_eq!(pixels.height(), 4);
        assert_eq!(pixels.width(), 7);
        assert_eq!(pixels.bit_depth(), 16);
    }
}
