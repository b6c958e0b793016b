//! Destinations for encoded frames.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};
use crate::pipeline::config::OutputFormat;

/// One encoded frame ready for persistence.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputArtifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Receives finished frames. Ownership of each artifact passes to the sink.
pub trait FrameSink {
    fn accept(&mut self, artifact: OutputArtifact) -> Result<()>;
}

/// Writes each artifact as `<dir>/<name>`.
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create the directory (and parents) if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for DirectorySink {
    fn accept(&mut self, artifact: OutputArtifact) -> Result<()> {
        let path = self.dir.join(&artifact.name);
        fs::write(&path, &artifact.bytes).map_err(|source| ExtractError::Sink {
            name: artifact.name,
            source,
        })?;
        self.written.push(path);
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Default)]
pub struct MemorySink {
    pub artifacts: Vec<OutputArtifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name.as_str()).collect()
    }
}

impl FrameSink for MemorySink {
    fn accept(&mut self, artifact: OutputArtifact) -> Result<()> {
        self.artifacts.push(artifact);
        Ok(())
    }
}

/// Zero-pad width for a file of `total_frames` frames: one digit more than
/// the count itself has.
pub fn name_width(total_frames: usize) -> usize {
    total_frames.to_string().len() + 1
}

pub fn artifact_name(index: usize, width: usize, format: OutputFormat) -> String {
    format!("{index:0width$}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_width() {
        assert_eq!(name_width(0), 2);
        assert_eq!(name_width(9), 2);
        assert_eq!(name_width(10), 3);
        assert_eq!(name_width(125), 4);
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name(7, 4, OutputFormat::Png), "0007.png");
        assert_eq!(artifact_name(124, 4, OutputFormat::Jpeg), "0124.jpeg");
        assert_eq!(artifact_name(12345, 3, OutputFormat::Png), "12345.png");
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("frames");
        let mut sink = DirectorySink::create(&target).unwrap();

        sink.accept(OutputArtifact {
            name: "00.png".into(),
            bytes: vec![1, 2, 3],
        })
        .unwrap();

        assert_eq!(sink.written().len(), 1);
        assert_eq!(fs::read(target.join("00.png")).unwrap(), vec![1, 2, 3]);
    }
}
