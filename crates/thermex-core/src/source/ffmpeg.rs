//! FFmpeg-backed video decoding.
//!
//! Frames are decoded in presentation order and converted to packed RGB24.

use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg::{
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{context::Input, Pixel},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
    Error as FfmpegError, Packet, Rational,
};
use ndarray::Array3;
use tracing::warn;

use super::video::VideoStream;
use crate::error::{ExtractError, Result};

const RGB_BYTES_PER_PIXEL: usize = 3;

pub struct FfmpegStream {
    input: Input,
    stream_index: usize,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    frame_count: usize,
    decoded: VideoFrame,
    rgb: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl FfmpegStream {
    pub fn open(path: &Path) -> Result<Self> {
        ffmpeg::init().map_err(ffmpeg_error)?;
        let input = ffmpeg::format::input(&path).map_err(|e| ExtractError::Open {
            path: path.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| ExtractError::VideoDecode("file has no video track".into()))?;
        let stream_index = stream.index();
        let frame_count = estimate_frame_count(&input, &stream);

        let context =
            CodecContext::from_parameters(stream.parameters()).map_err(ffmpeg_error)?;
        let decoder = context.decoder().video().map_err(ffmpeg_error)?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )
        .map_err(ffmpeg_error)?;

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            frame_count,
            decoded: VideoFrame::empty(),
            rgb: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    fn convert_current(&mut self) -> Result<Array3<u8>> {
        self.scaler
            .run(&self.decoded, &mut self.rgb)
            .map_err(ffmpeg_error)?;

        let width = self.rgb.width() as usize;
        let height = self.rgb.height() as usize;
        let row_bytes = width * RGB_BYTES_PER_PIXEL;
        let stride = self.rgb.stride(0);
        let data = self.rgb.data(0);

        let mut pixels = Vec::with_capacity(row_bytes * height);
        for row in 0..height {
            let start = row * stride;
            let line = data.get(start..start + row_bytes).ok_or_else(|| {
                ExtractError::VideoDecode("decoded frame row is out of bounds".into())
            })?;
            pixels.extend_from_slice(line);
        }

        Array3::from_shape_vec((height, width, RGB_BYTES_PER_PIXEL), pixels)
            .map_err(|e| ExtractError::VideoDecode(e.to_string()))
    }
}

impl VideoStream for FfmpegStream {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    fn read_next(&mut self) -> Result<Option<Array3<u8>>> {
        if self.decode_next()? {
            self.convert_current().map(Some)
        } else {
            Ok(None)
        }
    }

    fn skip_next(&mut self) -> Result<bool> {
        self.decode_next()
    }
}

impl FfmpegStream {
    /// Pull the next decoded frame into `self.decoded`. `false` once drained.
    fn decode_next(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }

        loop {
            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => return Ok(true),
                Err(FfmpegError::Eof) => {
                    self.done = true;
                    return Ok(false);
                }
                Err(FfmpegError::Other { errno }) if errno == EAGAIN => {}
                Err(e) => return Err(ffmpeg_error(e)),
            }

            if self.eof_sent {
                // Drained decoders report Eof; treat a stray EAGAIN the same.
                self.done = true;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet).map_err(ffmpeg_error)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof().map_err(ffmpeg_error)?;
                    self.eof_sent = true;
                }
                Err(e) => return Err(ffmpeg_error(e)),
            }
        }
    }
}

/// Container frame count, or duration × frame rate when the container
/// does not store one.
fn estimate_frame_count(input: &Input, stream: &ffmpeg::format::stream::Stream) -> usize {
    let stored = stream.frames();
    if stored > 0 {
        return stored as usize;
    }

    let estimate = frames_from_duration(input.duration(), stream.avg_frame_rate());
    warn!(estimate, "Container stores no frame count; estimating from duration");
    estimate
}

/// `duration` is in `AV_TIME_BASE` units (microseconds).
fn frames_from_duration(duration: i64, rate: Rational) -> usize {
    if duration <= 0 || rate.numerator() <= 0 || rate.denominator() <= 0 {
        return 0;
    }
    let fps = rate.numerator() as f64 / rate.denominator() as f64;
    let seconds = duration as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    (seconds * fps).round() as usize
}

fn ffmpeg_error(e: FfmpegError) -> ExtractError {
    ExtractError::VideoDecode(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_from_duration() {
        assert_eq!(frames_from_duration(2_000_000, Rational::new(25, 1)), 50);
        assert_eq!(frames_from_duration(1_001_000, Rational::new(30_000, 1_001)), 30);
        assert_eq!(frames_from_duration(600_000, Rational::new(10, 1)), 6);
    }

    #[test]
    fn test_frames_from_duration_unknown() {
        assert_eq!(frames_from_duration(0, Rational::new(25, 1)), 0);
        assert_eq!(frames_from_duration(-1, Rational::new(25, 1)), 0);
        assert_eq!(frames_from_duration(2_000_000, Rational::new(0, 0)), 0);
        assert_eq!(frames_from_duration(2_000_000, Rational::new(25, 0)), 0);
    }
}
