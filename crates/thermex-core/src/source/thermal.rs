use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::{debug, info};

use crate::consts::REQUIRED_UNIT_COUNT;
use crate::error::{ExtractError, Result};
use crate::frame::{Frame, FrameMetadata, FramePixels, SourceInfo};
use crate::io::seq::{MeasurementUnit, SeqReader};
use crate::normalize::{multiplex, normalize};

/// One measurement-unit view of a thermal recording.
pub trait UnitStream {
    fn unit(&self) -> MeasurementUnit;

    fn frame_count(&self) -> usize;

    /// Raw samples of frame `index`, expressed in [`UnitStream::unit`].
    fn read(&self, index: usize) -> Result<Array2<u16>>;

    fn timestamp(&self, _index: usize) -> Option<u64> {
        None
    }
}

/// A unit stream backed by its own [`SeqReader`] handle.
pub struct SeqUnitStream {
    reader: SeqReader,
    unit: MeasurementUnit,
}

impl SeqUnitStream {
    /// Open a fresh handle on `path` pinned to `unit`.
    pub fn open(path: &Path, unit: MeasurementUnit) -> Result<Self> {
        let reader = SeqReader::open(path)?;
        if !reader.header.supports(unit) {
            return Err(ExtractError::InvalidConfig(format!(
                "{} does not support the {unit} unit",
                path.display()
            )));
        }
        Ok(Self { reader, unit })
    }
}

impl UnitStream for SeqUnitStream {
    fn unit(&self) -> MeasurementUnit {
        self.unit
    }

    fn frame_count(&self) -> usize {
        self.reader.frame_count()
    }

    fn read(&self, index: usize) -> Result<Array2<u16>> {
        self.reader.read_unit(index, self.unit)
    }

    fn timestamp(&self, index: usize) -> Option<u64> {
        self.reader.read_timestamp(index)
    }
}

/// Pick the units that feed the three composite channels.
pub fn select_units(supported: &[MeasurementUnit]) -> Result<[MeasurementUnit; 3]> {
    if supported.len() < REQUIRED_UNIT_COUNT {
        return Err(ExtractError::NotEnoughUnits {
            found: supported.len(),
        });
    }
    Ok([supported[0], supported[1], supported[2]])
}

/// Three frame-aligned unit streams over one thermal recording.
pub struct ThermalSource {
    path: PathBuf,
    streams: [Box<dyn UnitStream>; 3],
    frame_count: usize,
    cursor: usize,
    info: Option<SourceInfo>,
}

impl ThermalSource {
    /// Open `path` with one independent handle per channel unit.
    ///
    /// Fails with [`ExtractError::NotEnoughUnits`] before any frame data is
    /// touched when the file supports fewer than three units.
    pub fn open(path: &Path) -> Result<Self> {
        let header_reader = SeqReader::open(path)?;
        let info = header_reader.source_info(path);
        drop(header_reader);

        let units = select_units(&info.units)?;
        info!(
            path = %path.display(),
            frames = info.total_frames,
            width = info.width,
            height = info.height,
            units = ?units,
            "Opening thermal sequence"
        );

        let streams: [Box<dyn UnitStream>; 3] = [
            Box::new(SeqUnitStream::open(path, units[0])?),
            Box::new(SeqUnitStream::open(path, units[1])?),
            Box::new(SeqUnitStream::open(path, units[2])?),
        ];

        let mut source = Self::from_streams(path, streams)?;
        source.info = Some(info);
        Ok(source)
    }

    /// Assemble a source from already opened streams.
    ///
    /// All streams must report the same frame count.
    pub fn from_streams(path: &Path, streams: [Box<dyn UnitStream>; 3]) -> Result<Self> {
        let counts = [
            streams[0].frame_count(),
            streams[1].frame_count(),
            streams[2].frame_count(),
        ];
        if counts[1] != counts[0] || counts[2] != counts[0] {
            return Err(ExtractError::FrameCountMismatch { counts });
        }

        Ok(Self {
            path: path.to_path_buf(),
            streams,
            frame_count: counts[0],
            cursor: 0,
            info: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn units(&self) -> [MeasurementUnit; 3] {
        [
            self.streams[0].unit(),
            self.streams[1].unit(),
            self.streams[2].unit(),
        ]
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Index of the frame the next read returns.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Header-derived info, when opened from a file.
    pub fn info(&self) -> Option<&SourceInfo> {
        self.info.as_ref()
    }

    /// Read, normalize and multiplex the next frame.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.frame_count {
            return Ok(None);
        }
        let index = self.cursor;
        let frame = self.composite(index)?;
        self.cursor += 1;
        Ok(Some(frame))
    }

    /// Advance past the next frame without reading it.
    pub fn skip_frame(&mut self) -> bool {
        if self.cursor >= self.frame_count {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn composite(&self, index: usize) -> Result<Frame> {
        // All three units are read for the same index before moving on.
        let channels = [
            normalize(&self.streams[0].read(index)?),
            normalize(&self.streams[1].read(index)?),
            normalize(&self.streams[2].read(index)?),
        ];
        let data = multiplex(&channels)?;

        Ok(Frame {
            pixels: FramePixels::Rgb16(data),
            metadata: FrameMetadata {
                frame_index: index,
                timestamp_us: self.streams[0].timestamp(index),
            },
        })
    }

    /// Release all unit handles.
    pub fn close(self) {
        debug!(path = %self.path.display(), frames_read = self.cursor, "Closing thermal sequence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_units_takes_first_three() {
        let supported = MeasurementUnit::ALL;
        assert_eq!(select_units(&supported).unwrap(), MeasurementUnit::ALL);
    }

    #[test]
    fn test_select_units_requires_three() {
        let supported = [MeasurementUnit::Counts, MeasurementUnit::Temperature];
        assert!(matches!(
            select_units(&supported),
            Err(ExtractError::NotEnoughUnits { found: 2 })
        ));
        assert!(matches!(
            select_units(&[]),
            Err(ExtractError::NotEnoughUnits { found: 0 })
        ));
    }
}
