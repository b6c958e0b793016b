use ndarray::{ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_SIMILARITY_THRESHOLD;
use crate::error::{ExtractError, Result};
use crate::frame::FramePixels;

/// Exact-equality change detector for dynamic sampling.
///
/// A candidate counts as changed when the share of element positions (all
/// channels) that hold exactly the same value as the previous frame drops
/// strictly below `threshold`. Off-by-one intensities everywhere count as a
/// complete change.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeDetector {
    threshold: f64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ChangeDetector {
    /// `threshold` must lie in `(0, 1]`.
    pub fn new(threshold: f64) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "similarity threshold must be in (0, 1], got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_different(&self, previous: &FramePixels, candidate: &FramePixels) -> Result<bool> {
        Ok(equal_fraction(previous, candidate)? < self.threshold)
    }
}

/// Share of positions whose values are identical in both frames.
pub fn equal_fraction(previous: &FramePixels, candidate: &FramePixels) -> Result<f64> {
    match (previous, candidate) {
        (FramePixels::Rgb8(a), FramePixels::Rgb8(b)) => equal_fraction_of(a, b),
        (FramePixels::Rgb16(a), FramePixels::Rgb16(b)) => equal_fraction_of(a, b),
        (a, b) => Err(ExtractError::PixelDepthMismatch {
            expected: a.bit_depth(),
            found: b.bit_depth(),
        }),
    }
}

/// Element-wise equality ratio of two arrays of identical shape.
pub fn equal_fraction_of<A, S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<f64>
where
    A: PartialEq,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return Err(ExtractError::ShapeMismatch {
            expected: a.shape().to_vec(),
            found: b.shape().to_vec(),
        });
    }
    if a.is_empty() {
        return Ok(1.0);
    }

    let equal = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    Ok(equal as f64 / a.len() as f64)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3};

    use super::*;

    #[test]
    fn test_rejects_out_of_range_threshold() {
        assert!(ChangeDetector::new(0.0).is_err());
        assert!(ChangeDetector::new(1.5).is_err());
        assert!(ChangeDetector::new(f64::NAN).is_err());
        assert!(ChangeDetector::new(1.0).is_ok());
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(ChangeDetector::default().threshold(), 0.8);
    }

    #[test]
    fn test_equal_fraction_of_half() {
        let a = Array2::from_shape_vec((2, 2), vec![1u8, 2, 3, 4]).unwrap();
        let b = Array2::from_shape_vec((2, 2), vec![1u8, 2, 0, 0]).unwrap();
        assert_eq!(equal_fraction_of(&a, &b).unwrap(), 0.5);
    }

    #[test]
    fn test_mixed_depths_are_rejected() {
        let a = FramePixels::Rgb8(Array3::zeros((2, 2, 3)));
        let b = FramePixels::Rgb16(Array3::zeros((2, 2, 3)));
        assert!(matches!(
            ChangeDetector::default().is_different(&a, &b),
            Err(ExtractError::PixelDepthMismatch { expected: 8, found: 16 })
        ));
    }
}
