use std::io::Cursor;

use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, ImageBuffer, ImageError, ImageResult, Rgb};

use crate::frame::FramePixels;
use crate::pipeline::config::OutputFormat;

/// Encode frame pixels into an in-memory image file.
///
/// PNG keeps the source bit depth (16-bit composites stay 16-bit). JPEG is
/// always 8-bit.
pub fn encode_frame(pixels: &FramePixels, format: OutputFormat) -> ImageResult<Vec<u8>> {
    let image = to_dynamic_image(pixels)?;
    let image = match format {
        OutputFormat::Png => image,
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
    };

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format.image_format())?;
    Ok(bytes)
}

/// Wrap frame pixels in an `image` buffer of matching depth.
pub fn to_dynamic_image(pixels: &FramePixels) -> ImageResult<DynamicImage> {
    let w = pixels.width() as u32;
    let h = pixels.height() as u32;

    let image = match pixels {
        FramePixels::Rgb8(data) => {
            let raw: Vec<u8> = data.iter().copied().collect();
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(w, h, raw).map(DynamicImage::ImageRgb8)
        }
        FramePixels::Rgb16(data) => {
            let raw: Vec<u16> = data.iter().copied().collect();
            ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w, h, raw).map(DynamicImage::ImageRgb16)
        }
    };

    image.ok_or_else(|| {
        ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
    })
}
