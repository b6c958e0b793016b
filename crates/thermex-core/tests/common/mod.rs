#![allow(dead_code)]

use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::codecs::gif::GifEncoder;
use image::{Rgba, RgbaImage};
use ndarray::Array2;

use thermex_core::error::{ExtractError, Result};
use thermex_core::io::seq::{MeasurementUnit, SeqHeader};
use thermex_core::io::seq_writer::SeqWriter;
use thermex_core::sink::{FrameSink, OutputArtifact};
use thermex_core::source::UnitStream;

/// A frame of raw counts in a range every unit can represent.
///
/// Values rise left to right and top to bottom starting at `base`.
pub fn ramp_frame(height: usize, width: usize, base: u16) -> Array2<u16> {
    Array2::from_shape_fn((height, width), |(r, c)| {
        base + (r * width + c) as u16 * 37
    })
}

/// Write a thermal sequence with the given frames and supported units.
pub fn write_thermal_seq(
    dir: &Path,
    name: &str,
    frames: &[Array2<u16>],
    units: &[MeasurementUnit],
) -> PathBuf {
    let (h, w) = frames[0].dim();
    let mut header = SeqHeader::new(w as u32, h as u32, frames.len() as u32, units);
    header.camera_model = "TestCam 640".into();

    let path = dir.join(name);
    let mut writer = SeqWriter::create(&path, &header).expect("create sequence");
    for frame in frames {
        writer.write_frame(frame).expect("write frame");
    }
    writer.finalize().expect("finalize sequence");
    path
}

/// `count` distinct ramp frames supporting all three units.
pub fn write_ramp_seq(dir: &Path, name: &str, count: usize) -> PathBuf {
    let frames: Vec<Array2<u16>> = (0..count)
        .map(|i| ramp_frame(4, 5, 10_000 + i as u16 * 50))
        .collect();
    write_thermal_seq(dir, name, &frames, &MeasurementUnit::ALL)
}

/// Write an animated GIF of solid-colour frames.
pub fn write_solid_gif(dir: &Path, name: &str, width: u32, height: u32, colors: &[[u8; 3]]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create gif");
    {
        let mut encoder = GifEncoder::new(file);
        let frames = colors.iter().map(|c| {
            image::Frame::new(RgbaImage::from_pixel(
                width,
                height,
                Rgba([c[0], c[1], c[2], 255]),
            ))
        });
        encoder.encode_frames(frames).expect("encode gif");
    }
    path
}

/// Observable counters shared with a [`ScriptedStream`].
#[derive(Clone, Default)]
pub struct StreamLog {
    pub reads: Rc<RefCell<usize>>,
    pub drops: Rc<RefCell<usize>>,
}

impl StreamLog {
    pub fn reads(&self) -> usize {
        *self.reads.borrow()
    }

    pub fn drops(&self) -> usize {
        *self.drops.borrow()
    }
}

/// In-memory unit stream returning pre-baked frames.
pub struct ScriptedStream {
    pub unit: MeasurementUnit,
    pub frames: Vec<Array2<u16>>,
    pub log: StreamLog,
}

impl ScriptedStream {
    pub fn boxed(
        unit: MeasurementUnit,
        frames: Vec<Array2<u16>>,
        log: &StreamLog,
    ) -> Box<dyn UnitStream> {
        Box::new(Self {
            unit,
            frames,
            log: log.clone(),
        })
    }
}

impl UnitStream for ScriptedStream {
    fn unit(&self) -> MeasurementUnit {
        self.unit
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn read(&self, index: usize) -> Result<Array2<u16>> {
        *self.log.reads.borrow_mut() += 1;
        self.frames
            .get(index)
            .cloned()
            .ok_or(ExtractError::FrameIndexOutOfRange {
                index,
                total: self.frames.len(),
            })
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        *self.log.drops.borrow_mut() += 1;
    }
}

/// Three scripted streams over the same frames.
pub fn scripted_streams(frames: &[Array2<u16>], log: &StreamLog) -> [Box<dyn UnitStream>; 3] {
    [
        ScriptedStream::boxed(MeasurementUnit::Counts, frames.to_vec(), log),
        ScriptedStream::boxed(MeasurementUnit::Radiance, frames.to_vec(), log),
        ScriptedStream::boxed(MeasurementUnit::Temperature, frames.to_vec(), log),
    ]
}

/// Sink that accepts `limit` artifacts and then fails.
pub struct FailingSink {
    pub limit: usize,
    pub accepted: Vec<OutputArtifact>,
}

impl FrameSink for FailingSink {
    fn accept(&mut self, artifact: OutputArtifact) -> Result<()> {
        if self.accepted.len() >= self.limit {
            return Err(ExtractError::Sink {
                name: artifact.name,
                source: std::io::Error::other("disk full"),
            });
        }
        self.accepted.push(artifact);
        Ok(())
    }
}

/// Encode solid-colour frames into a lossless FFV1/Matroska clip at 10 fps.
///
/// FFV1 is intra-only and lossless, so identical input frames decode to
/// identical pixels.
#[cfg(feature = "ffmpeg")]
pub fn write_test_video(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    colors: &[[u8; 3]],
) -> PathBuf {
    use ffmpeg_next::codec::context::Context as CodecContext;
    use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
    use ffmpeg_next::frame::Video as VideoFrame;
    use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
    use ffmpeg_next::{codec, Rational};

    const FPS: i32 = 10;

    ffmpeg_next::init().expect("init ffmpeg");
    let path = dir.join(name);
    let mut output = ffmpeg_next::format::output(&path).expect("open output");
    let global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(codec::Id::FFV1).expect("ffv1 encoder");
    let mut stream = output.add_stream(codec).expect("add stream");
    let stream_index = stream.index();

    let mut encoder = CodecContext::from_parameters(stream.parameters())
        .expect("codec context")
        .encoder()
        .video()
        .expect("video encoder");
    encoder.set_width(width);
    encoder.set_height(height);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(Rational::new(1, FPS));
    encoder.set_frame_rate(Some(Rational::new(FPS, 1)));
    if global_header {
        encoder.set_flags(codec::Flags::GLOBAL_HEADER);
    }
    let mut encoder = encoder.open_as(codec).expect("open encoder");
    stream.set_parameters(&encoder);
    stream.set_time_base(Rational::new(1, FPS));

    output.write_header().expect("write header");
    let stream_time_base = output.stream(stream_index).expect("stream").time_base();

    let mut scaler = ScalingContext::get(
        Pixel::RGB24,
        width,
        height,
        Pixel::YUV420P,
        width,
        height,
        ScalingFlags::BILINEAR,
    )
    .expect("scaler");

    for (i, color) in colors.iter().enumerate() {
        let mut rgb = VideoFrame::new(Pixel::RGB24, width, height);
        let stride = rgb.stride(0);
        let data = rgb.data_mut(0);
        for row in 0..height as usize {
            for col in 0..width as usize {
                let at = row * stride + col * 3;
                data[at..at + 3].copy_from_slice(color);
            }
        }

        let mut yuv = VideoFrame::empty();
        scaler.run(&rgb, &mut yuv).expect("scale frame");
        yuv.set_pts(Some(i as i64));
        encoder.send_frame(&yuv).expect("send frame");
        write_packets(&mut encoder, &mut output, stream_index, Rational::new(1, FPS), stream_time_base);
    }

    encoder.send_eof().expect("send eof");
    write_packets(&mut encoder, &mut output, stream_index, Rational::new(1, FPS), stream_time_base);
    output.write_trailer().expect("write trailer");
    path
}

#[cfg(feature = "ffmpeg")]
fn write_packets(
    encoder: &mut ffmpeg_next::encoder::Video,
    output: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    encoder_time_base: ffmpeg_next::Rational,
    stream_time_base: ffmpeg_next::Rational,
) {
    let mut packet = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(encoder_time_base, stream_time_base);
        packet.write_interleaved(output).expect("write packet");
    }
}
