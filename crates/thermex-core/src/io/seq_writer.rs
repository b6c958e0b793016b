use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;

use crate::error::{ExtractError, Result};
use crate::io::seq::{SeqHeader, SEQ_HEADER_SIZE, SEQ_MAGIC};

/// Writes a thermal sequence file at the raw byte level.
pub struct SeqWriter {
    writer: BufWriter<File>,
    header: SeqHeader,
    frames_written: u32,
}

impl SeqWriter {
    /// Create a new sequence file and write the header.
    pub fn create(path: &Path, header: &SeqHeader) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            frames_written: 0,
        })
    }

    /// Write one frame of raw sensor counts.
    pub fn write_frame(&mut self, counts: &Array2<u16>) -> Result<()> {
        let expected = (self.header.height as usize, self.header.width as usize);
        if counts.dim() != expected {
            return Err(ExtractError::ShapeMismatch {
                expected: vec![expected.0, expected.1],
                found: counts.shape().to_vec(),
            });
        }
        for &sample in counts.iter() {
            self.writer.write_all(&sample.to_le_bytes())?;
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Write the optional timestamp trailer (one u64 per frame, little-endian).
    pub fn write_timestamps(&mut self, timestamps: &[u64]) -> Result<()> {
        for &ts in timestamps {
            self.writer.write_all(&ts.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    /// Flush and finalize the file.
    pub fn finalize(mut self) -> Result<()> {
        if self.frames_written != self.header.frame_count {
            return Err(ExtractError::InvalidContainer(format!(
                "Header announces {} frames but {} were written",
                self.header.frame_count, self.frames_written
            )));
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn write_header(w: &mut impl Write, header: &SeqHeader) -> Result<()> {
    w.write_all(SEQ_MAGIC)?;
    w.write_all(&header.version.to_le_bytes())?;
    w.write_all(&header.width.to_le_bytes())?;
    w.write_all(&header.height.to_le_bytes())?;
    w.write_all(&header.frame_count.to_le_bytes())?;
    w.write_all(&header.unit_mask.to_le_bytes())?;

    let cal = &header.calibration;
    for value in [cal.r1, cal.r2, cal.b, cal.f, cal.o] {
        w.write_all(&value.to_le_bytes())?;
    }

    write_fixed_string(w, &header.camera_model, 32)?;

    debug_assert_eq!(8 + 4 * 5 + 8 * 5 + 32, SEQ_HEADER_SIZE);
    Ok(())
}

fn write_fixed_string(w: &mut impl Write, s: &str, len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    let to_write = bytes.len().min(len);
    w.write_all(&bytes[..to_write])?;
    w.write_all(&vec![0u8; len - to_write])?;
    Ok(())
}
