//! Contrast stretching of raw thermal samples and channel stacking.
//!
//! Every frame is stretched with its own minimum and maximum, so brightness
//! is not comparable between frames. This is a display mapping, not a
//! radiometric one.

use ndarray::{stack, Array2, Array3, Axis, Zip};

use crate::consts::{COMPOSITE_CHANNEL_COUNT, NORMALIZED_MAX, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{ExtractError, Result};

/// Linearly rescale a raw frame onto `[0, 65535]` using its own min/max.
///
/// A constant frame has no range to stretch and maps to all zeros.
pub fn normalize(raw: &Array2<u16>) -> Array2<u16> {
    let Some((min, max)) = min_max(raw) else {
        return Array2::zeros(raw.dim());
    };
    if max == min {
        return Array2::zeros(raw.dim());
    }

    let min = min as f64;
    let range = max as f64 - min;
    let stretch = |&v: &u16| ((v as f64 - min) * NORMALIZED_MAX / range).round() as u16;

    if raw.len() >= PARALLEL_PIXEL_THRESHOLD {
        Zip::from(raw).par_map_collect(stretch)
    } else {
        raw.map(stretch)
    }
}

fn min_max(raw: &Array2<u16>) -> Option<(u16, u16)> {
    raw.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Stack three single-unit frames into one (H, W, 3) composite.
///
/// Channel order follows the argument order.
pub fn multiplex(channels: &[Array2<u16>; COMPOSITE_CHANNEL_COUNT]) -> Result<Array3<u16>> {
    let expected = channels[0].shape();
    for channel in &channels[1..] {
        if channel.shape() != expected {
            return Err(ExtractError::ShapeMismatch {
                expected: expected.to_vec(),
                found: channel.shape().to_vec(),
            });
        }
    }

    let views = [channels[0].view(), channels[1].view(), channels[2].view()];
    stack(Axis(2), &views).map_err(|_| ExtractError::ShapeMismatch {
        expected: expected.to_vec(),
        found: expected.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        let data = Array2::from_shape_vec((2, 2), vec![7, 3, 9, 4]).unwrap();
        assert_eq!(min_max(&data), Some((3, 9)));
    }

    #[test]
    fn test_stretch_endpoints() {
        let data = Array2::from_shape_vec((1, 3), vec![100, 150, 200]).unwrap();
        let out = normalize(&data);
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[0, 1]], 32_768);
        assert_eq!(out[[0, 2]], 65_535);
    }

    #[test]
    fn test_large_frame_uses_same_mapping() {
        let data = Array2::from_shape_fn((256, 300), |(r, c)| ((r * 31 + c * 7) % 4000) as u16);
        assert!(data.len() >= PARALLEL_PIXEL_THRESHOLD);
        let (min, max) = min_max(&data).unwrap();
        let range = (max - min) as f64;

        let out = normalize(&data);
        for (&raw, &stretched) in data.iter().zip(out.iter()) {
            let expected = ((raw - min) as f64 * NORMALIZED_MAX / range).round() as u16;
            assert_eq!(stretched, expected);
        }
    }
}
