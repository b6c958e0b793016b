use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Frames, ImageDecoder, ImageError, RgbaImage};
use ndarray::Array3;
use tracing::{debug, info};

use crate::error::{ExtractError, Result};
use crate::frame::{ContainerKind, Frame, FramePixels, SourceInfo};

/// A decoder that yields RGB frames strictly in order.
pub trait VideoStream {
    /// Frame count from container metadata; may be approximate.
    fn frame_count(&self) -> usize;

    /// (width, height) of decoded frames.
    fn dimensions(&self) -> (u32, u32);

    /// Decode the next frame, `None` at end of stream.
    fn read_next(&mut self) -> Result<Option<Array3<u8>>>;

    /// Move past the next frame without converting it to RGB.
    /// Returns `false` at end of stream.
    fn skip_next(&mut self) -> Result<bool> {
        Ok(self.read_next()?.is_some())
    }
}

/// A conventional video file. Frames are already three-channel.
pub struct VideoSource {
    path: PathBuf,
    kind: ContainerKind,
    stream: Box<dyn VideoStream>,
    cursor: usize,
}

impl VideoSource {
    pub fn open(path: &Path, kind: ContainerKind) -> Result<Self> {
        let stream: Box<dyn VideoStream> = match kind {
            ContainerKind::Gif => Box::new(GifStream::open(path)?),
            ContainerKind::Video => open_ffmpeg(path)?,
            ContainerKind::ThermalSequence => {
                return Err(ExtractError::UnsupportedContainer(format!(
                    "{} is a thermal sequence, not a video",
                    path.display()
                )))
            }
        };

        let (width, height) = stream.dimensions();
        info!(
            path = %path.display(),
            frames = stream.frame_count(),
            width,
            height,
            "Opening video"
        );

        Ok(Self::from_stream(path, kind, stream))
    }

    pub fn from_stream(path: &Path, kind: ContainerKind, stream: Box<dyn VideoStream>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            stream,
            cursor: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn frame_count(&self) -> usize {
        self.stream.frame_count()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.stream.read_next()? {
            Some(data) => {
                let frame = Frame::new(FramePixels::Rgb8(data), self.cursor);
                self.cursor += 1;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    /// Advance past the next frame. Returns `false` at end of stream.
    ///
    /// Video is decoded sequentially, so the frame is still decoded, but
    /// never converted.
    pub fn skip_frame(&mut self) -> Result<bool> {
        let skipped = self.stream.skip_next()?;
        if skipped {
            self.cursor += 1;
        }
        Ok(skipped)
    }

    pub fn source_info(&self) -> SourceInfo {
        let (width, height) = self.stream.dimensions();
        SourceInfo {
            filename: self.path.clone(),
            kind: self.kind,
            total_frames: self.stream.frame_count(),
            width,
            height,
            units: Vec::new(),
            calibration: None,
            camera_model: None,
        }
    }

    pub fn close(self) {
        debug!(path = %self.path.display(), frames_read = self.cursor, "Closing video");
    }
}

#[cfg(feature = "ffmpeg")]
fn open_ffmpeg(path: &Path) -> Result<Box<dyn VideoStream>> {
    Ok(Box::new(super::ffmpeg::FfmpegStream::open(path)?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_ffmpeg(path: &Path) -> Result<Box<dyn VideoStream>> {
    Err(ExtractError::UnsupportedContainer(format!(
        "{}: video decoding requires the `ffmpeg` feature",
        path.display()
    )))
}

/// Animated GIF decoded with the `image` crate.
pub struct GifStream {
    frames: Frames<'static>,
    frame_count: usize,
    width: u32,
    height: u32,
}

impl GifStream {
    pub fn open(path: &Path) -> Result<Self> {
        // GIF has no frame count in its header; count with a throwaway pass.
        let (width, height, frame_count) = {
            let decoder = gif_decoder(path)?;
            let (w, h) = decoder.dimensions();
            let mut count = 0;
            for frame in decoder.into_frames() {
                frame.map_err(decode_error)?;
                count += 1;
            }
            (w, h, count)
        };

        let frames = gif_decoder(path)?.into_frames();
        Ok(Self {
            frames,
            frame_count,
            width,
            height,
        })
    }
}

impl VideoStream for GifStream {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_next(&mut self) -> Result<Option<Array3<u8>>> {
        match self.frames.next() {
            None => Ok(None),
            Some(frame) => {
                let buffer = frame.map_err(decode_error)?.into_buffer();
                Ok(Some(rgba_to_rgb_array(&buffer)))
            }
        }
    }

    fn skip_next(&mut self) -> Result<bool> {
        match self.frames.next() {
            None => Ok(false),
            Some(frame) => frame.map(|_| true).map_err(decode_error),
        }
    }
}

fn gif_decoder(path: &Path) -> Result<GifDecoder<BufReader<File>>> {
    let file = File::open(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    GifDecoder::new(BufReader::new(file)).map_err(decode_error)
}

fn decode_error(e: ImageError) -> ExtractError {
    ExtractError::VideoDecode(e.to_string())
}

/// Drop the alpha channel; shape = (height, width, 3).
fn rgba_to_rgb_array(buffer: &RgbaImage) -> Array3<u8> {
    let (w, h) = buffer.dimensions();
    Array3::from_shape_fn((h as usize, w as usize, 3), |(row, col, ch)| {
        buffer.get_pixel(col as u32, row as u32).0[ch]
    })
}
