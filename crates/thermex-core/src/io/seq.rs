use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{KELVIN_OFFSET, TEMPERATURE_SCALE};
use crate::error::{ExtractError, Result};
use crate::frame::{ContainerKind, SourceInfo};

pub const SEQ_HEADER_SIZE: usize = 100;
pub const SEQ_MAGIC: &[u8; 8] = b"THRMSEQ\0";
pub const SEQ_VERSION: u32 = 1;

const BYTES_PER_SAMPLE: usize = 2;
const CAMERA_MODEL_LEN: usize = 32;

/// Unit system under which a thermal sample can be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementUnit {
    /// Raw sensor counts, as recorded.
    Counts,
    /// Offset-corrected object signal (`counts + O`).
    Radiance,
    /// Object temperature in centi-kelvin via the inverse Planck relation.
    Temperature,
}

impl MeasurementUnit {
    /// All units in header bit order.
    pub const ALL: [MeasurementUnit; 3] = [Self::Counts, Self::Radiance, Self::Temperature];

    pub fn bit(self) -> u32 {
        match self {
            Self::Counts => 1 << 0,
            Self::Radiance => 1 << 1,
            Self::Temperature => 1 << 2,
        }
    }

    /// Map one raw count into this unit's 16-bit sample.
    pub fn convert(self, counts: u16, calibration: &Calibration) -> u16 {
        match self {
            Self::Counts => counts,
            Self::Radiance => saturate_u16(counts as f64 + calibration.o),
            Self::Temperature => calibration
                .raw_to_kelvin(counts)
                .map(|kelvin| saturate_u16(kelvin * TEMPERATURE_SCALE))
                .unwrap_or(0),
        }
    }
}

impl std::fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counts => write!(f, "Counts"),
            Self::Radiance => write!(f, "Radiance"),
            Self::Temperature => write!(f, "Temperature"),
        }
    }
}

/// Planck calibration constants of the sensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub r1: f64,
    pub r2: f64,
    pub b: f64,
    pub f: f64,
    pub o: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            r1: 21_106.77,
            r2: 0.012_545_258,
            b: 1_501.0,
            f: 1.0,
            o: -7_340.0,
        }
    }
}

impl Calibration {
    /// Object temperature in kelvin, or `None` where the relation is undefined.
    pub fn raw_to_kelvin(&self, counts: u16) -> Option<f64> {
        let signal = counts as f64 + self.o;
        if signal <= 0.0 {
            return None;
        }
        let kelvin = self.b / (self.r1 / (self.r2 * signal) + self.f).ln();
        (kelvin.is_finite() && kelvin > 0.0).then_some(kelvin)
    }

    pub fn raw_to_celsius(&self, counts: u16) -> Option<f64> {
        self.raw_to_kelvin(counts).map(|k| k - KELVIN_OFFSET)
    }
}

/// Thermal sequence header (100 bytes).
#[derive(Clone, Debug)]
pub struct SeqHeader {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub unit_mask: u32,
    pub calibration: Calibration,
    pub camera_model: String,
}

impl SeqHeader {
    pub fn new(width: u32, height: u32, frame_count: u32, units: &[MeasurementUnit]) -> Self {
        Self {
            version: SEQ_VERSION,
            width,
            height,
            frame_count,
            unit_mask: units.iter().fold(0, |mask, unit| mask | unit.bit()),
            calibration: Calibration::default(),
            camera_model: String::new(),
        }
    }

    /// Total bytes per frame, `None` if it does not fit in `usize`.
    pub fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(BYTES_PER_SAMPLE)
    }

    /// Header plus frame data in bytes, excluding the timestamp trailer.
    pub fn data_size(&self) -> Option<u64> {
        (self.frame_byte_size()? as u64)
            .checked_mul(self.frame_count as u64)?
            .checked_add(SEQ_HEADER_SIZE as u64)
    }

    /// Units flagged in the header, in bit order.
    pub fn supported_units(&self) -> Vec<MeasurementUnit> {
        MeasurementUnit::ALL
            .into_iter()
            .filter(|unit| self.unit_mask & unit.bit() != 0)
            .collect()
    }

    pub fn supports(&self, unit: MeasurementUnit) -> bool {
        self.unit_mask & unit.bit() != 0
    }
}

/// Memory-mapped thermal sequence reader.
///
/// Each reader owns its own file handle and mapping; opening the same file
/// several times yields fully independent readers.
pub struct SeqReader {
    mmap: Mmap,
    frame_bytes: usize,
    pub header: SeqHeader,
}

impl SeqReader {
    /// Open a thermal sequence and validate its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SEQ_HEADER_SIZE {
            return Err(ExtractError::InvalidContainer(
                "File too small for sequence header".into(),
            ));
        }

        if &mmap[0..8] != SEQ_MAGIC {
            return Err(ExtractError::InvalidContainer(
                "Missing THRMSEQ magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SEQ_HEADER_SIZE])?;

        let Some((frame_bytes, expected_data_size)) =
            header.frame_byte_size().zip(header.data_size())
        else {
            return Err(ExtractError::InvalidContainer(format!(
                "Header size overflows: {}x{} x {} frames",
                header.width, header.height, header.frame_count
            )));
        };
        if (mmap.len() as u64) < expected_data_size {
            return Err(ExtractError::InvalidContainer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            frame_bytes,
            header,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(ExtractError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        // In bounds: open() checked the mapping covers every frame.
        let offset = SEQ_HEADER_SIZE + index * self.frame_bytes;
        let end = offset + self.frame_bytes;
        Ok(&self.mmap[offset..end])
    }

    /// Raw sensor counts of one frame.
    pub fn read_counts(&self, index: usize) -> Result<Array2<u16>> {
        self.read_unit(index, MeasurementUnit::Counts)
    }

    /// One frame expressed in `unit`.
    pub fn read_unit(&self, index: usize, unit: MeasurementUnit) -> Result<Array2<u16>> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let calibration = &self.header.calibration;

        let samples: Vec<u16> = raw
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| unit.convert(u16::from_le_bytes([pair[0], pair[1]]), calibration))
            .collect();

        Array2::from_shape_vec((h, w), samples)
            .map_err(|e| ExtractError::InvalidContainer(format!("Frame {index}: {e}")))
    }

    /// Read per-frame timestamp from the optional trailer.
    pub fn read_timestamp(&self, index: usize) -> Option<u64> {
        if index >= self.frame_count() {
            return None;
        }
        let trailer_offset = SEQ_HEADER_SIZE + self.frame_bytes * self.frame_count();
        let ts_offset = trailer_offset.checked_add(index.checked_mul(8)?)?;
        if ts_offset + 8 <= self.mmap.len() {
            let bytes = &self.mmap[ts_offset..ts_offset + 8];
            Some(u64::from_le_bytes(bytes.try_into().ok()?))
        } else {
            None
        }
    }

    /// Build SourceInfo from the header.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            kind: ContainerKind::ThermalSequence,
            total_frames: self.frame_count(),
            width: self.header.width,
            height: self.header.height,
            units: self.header.supported_units(),
            calibration: Some(self.header.calibration),
            camera_model: non_empty(&self.header.camera_model),
        }
    }
}

fn parse_header(buf: &[u8]) -> Result<SeqHeader> {
    let mut cursor = std::io::Cursor::new(&buf[8..]); // skip magic

    let version = cursor.read_u32::<LittleEndian>()?;
    let width = cursor.read_u32::<LittleEndian>()?;
    let height = cursor.read_u32::<LittleEndian>()?;
    let frame_count = cursor.read_u32::<LittleEndian>()?;
    let unit_mask = cursor.read_u32::<LittleEndian>()?;

    let calibration = Calibration {
        r1: cursor.read_f64::<LittleEndian>()?,
        r2: cursor.read_f64::<LittleEndian>()?,
        b: cursor.read_f64::<LittleEndian>()?,
        f: cursor.read_f64::<LittleEndian>()?,
        o: cursor.read_f64::<LittleEndian>()?,
    };

    let camera_model = read_fixed_string(&buf[68..68 + CAMERA_MODEL_LEN]);

    if version != SEQ_VERSION {
        return Err(ExtractError::InvalidContainer(format!(
            "Unsupported version {version}"
        )));
    }

    if width == 0 || height == 0 {
        return Err(ExtractError::InvalidContainer(format!(
            "Invalid frame dimensions {width}x{height}"
        )));
    }

    Ok(SeqHeader {
        version,
        width,
        height,
        frame_count,
        unit_mask,
        calibration,
        camera_model,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn saturate_u16(value: f64) -> u16 {
    if value.is_finite() {
        value.round().clamp(0.0, u16::MAX as f64) as u16
    } else {
        0
    }
}
