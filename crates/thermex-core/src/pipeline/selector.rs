use crate::detect::ChangeDetector;
use crate::error::Result;
use crate::frame::{Frame, FramePixels};

use super::config::{ExtractionConfig, ExtractionMode};

/// Per-file retention state.
pub enum FrameSelector {
    Interval {
        every: usize,
    },
    Dynamic {
        detector: ChangeDetector,
        last_kept: Option<FramePixels>,
    },
}

impl FrameSelector {
    /// Build from a validated config.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(match config.mode {
            ExtractionMode::Interval => Self::Interval {
                every: config.interval.max(1),
            },
            ExtractionMode::Dynamic => Self::Dynamic {
                detector: ChangeDetector::new(config.similarity_threshold)?,
                last_kept: None,
            },
        })
    }

    /// Whether frame `index` must be decoded at all.
    pub fn needs_pixels(&self, index: usize) -> bool {
        match self {
            Self::Interval { every } => index % every == 0,
            Self::Dynamic { .. } => true,
        }
    }

    /// Decide retention for `frame`, remembering it when kept.
    pub fn keep(&mut self, frame: &Frame) -> Result<bool> {
        match self {
            Self::Interval { every } => Ok(frame.index() % *every == 0),
            Self::Dynamic {
                detector,
                last_kept,
            } => {
                let keep = match last_kept {
                    None => true,
                    Some(previous) => detector.is_different(previous, &frame.pixels)?,
                };
                if keep {
                    *last_kept = Some(frame.pixels.clone());
                }
                Ok(keep)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    fn solid(index: usize, value: u8) -> Frame {
        Frame::new(FramePixels::Rgb8(Array3::from_elem((2, 2, 3), value)), index)
    }

    #[test]
    fn test_interval_keeps_multiples() {
        let mut selector = FrameSelector::from_config(&ExtractionConfig::interval(3)).unwrap();
        let kept: Vec<usize> = (0..10)
            .filter(|&i| selector.keep(&solid(i, 0)).unwrap())
            .collect();
        assert_eq!(kept, vec![0, 3, 6, 9]);
        assert!(selector.needs_pixels(6));
        assert!(!selector.needs_pixels(7));
    }

    #[test]
    fn test_dynamic_compares_against_last_kept() {
        let mut selector = FrameSelector::from_config(&ExtractionConfig::dynamic(0.8)).unwrap();
        assert!(selector.keep(&solid(0, 10)).unwrap());
        assert!(!selector.keep(&solid(1, 10)).unwrap());
        assert!(selector.keep(&solid(2, 11)).unwrap());
        assert!(!selector.keep(&solid(3, 11)).unwrap());
    }

    #[test]
    fn test_dynamic_keeps_first_frame_at_any_threshold() {
        for threshold in [0.01, 0.5, 1.0] {
            let mut selector =
                FrameSelector::from_config(&ExtractionConfig::dynamic(threshold)).unwrap();
            assert!(selector.keep(&solid(0, 0)).unwrap());
        }
    }
}
