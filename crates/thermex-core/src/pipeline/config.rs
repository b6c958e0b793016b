use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_INTERVAL, DEFAULT_SIMILARITY_THRESHOLD};
use crate::detect::ChangeDetector;
use crate::error::{ExtractError, Result};

/// Frame retention policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Keep every `interval`-th frame.
    #[default]
    Interval,
    /// Keep frames that differ enough from the last kept one.
    Dynamic,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval => write!(f, "Interval"),
            Self::Dynamic => write!(f, "Dynamic"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
        }
    }
}

/// Run configuration, fixed for the whole extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub mode: ExtractionMode,
    /// Only used in interval mode.
    pub interval: usize,
    /// Only used in dynamic mode.
    pub similarity_threshold: f64,
    pub output_format: OutputFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Interval,
            interval: DEFAULT_INTERVAL,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            output_format: OutputFormat::Png,
        }
    }
}

impl ExtractionConfig {
    pub fn interval(every: usize) -> Self {
        Self {
            mode: ExtractionMode::Interval,
            interval: every,
            ..Default::default()
        }
    }

    pub fn dynamic(similarity_threshold: f64) -> Self {
        Self {
            mode: ExtractionMode::Dynamic,
            similarity_threshold,
            ..Default::default()
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Check interval and threshold ranges.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(ExtractError::InvalidConfig(
                "interval must be a positive integer".into(),
            ));
        }
        ChangeDetector::new(self.similarity_threshold)?;
        Ok(())
    }
}
