use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ExtractError, Result};
use crate::io::image_io::encode_frame;
use crate::sink::{artifact_name, name_width, FrameSink, OutputArtifact};
use crate::source::FrameSource;

use super::config::ExtractionConfig;
use super::selector::FrameSelector;
use super::types::{
    CancellationToken, ExtractionState, ExtractionSummary, NoOpReporter, ProgressReporter,
};

/// Drives one input file through open, traversal, retention and close.
pub struct Extractor {
    config: ExtractionConfig,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
}

impl Extractor {
    /// Validates `config` before any file is touched.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reporter: Arc::new(NoOpReporter),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Open `path` and extract it into `sink`.
    pub fn extract(&self, path: &Path, sink: &mut dyn FrameSink) -> Result<ExtractionSummary> {
        let source = FrameSource::open(path)?;
        self.extract_source(source, sink)
    }

    /// Extract an already opened source. The source is closed on every path.
    pub fn extract_source(
        &self,
        mut source: FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<ExtractionSummary> {
        let mut run = Run::new(source.path());
        run.transition(ExtractionState::Opened);

        let result = self.drain(&mut source, sink, &mut run);
        let kind = source.kind();
        let total_frames = source.frame_count();
        source.close();

        match result {
            Ok(()) => {
                run.transition(ExtractionState::Closed);
                info!(
                    path = %run.path.display(),
                    read = run.frames_read,
                    kept = run.kept.len(),
                    "Extraction complete"
                );
                Ok(ExtractionSummary {
                    source: run.path,
                    kind,
                    total_frames,
                    frames_read: run.frames_read,
                    kept: run.kept,
                    names: run.names,
                    state: run.state,
                })
            }
            Err(e) => {
                run.transition(ExtractionState::Failed);
                warn!(path = %run.path.display(), error = %e, "Extraction failed");
                Err(e)
            }
        }
    }

    fn drain(
        &self,
        source: &mut FrameSource,
        sink: &mut dyn FrameSink,
        run: &mut Run,
    ) -> Result<()> {
        let total = source.frame_count();
        let width = name_width(total);
        let format = self.config.output_format;
        let mut selector = FrameSelector::from_config(&self.config)?;

        run.transition(ExtractionState::Iterating);
        self.reporter.begin(Some(total));

        loop {
            if self.cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }

            let index = source.position();
            if !selector.needs_pixels(index) {
                if !source.skip_frame()? {
                    break;
                }
                run.frames_read += 1;
                self.reporter.advance(run.frames_read);
                continue;
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };
            run.frames_read += 1;

            if selector.keep(&frame)? {
                let bytes = encode_frame(&frame.pixels, format)
                    .map_err(|e| ExtractError::Codec { index, source: e })?;
                let name = artifact_name(index, width, format);
                debug!(index, name = %name, bytes = bytes.len(), "Retained frame");
                sink.accept(OutputArtifact {
                    name: name.clone(),
                    bytes,
                })?;
                run.kept.push(index);
                run.names.push(name);
            }

            self.reporter.advance(run.frames_read);
        }

        self.reporter.finish();
        Ok(())
    }
}

/// Bookkeeping for one extraction.
struct Run {
    path: PathBuf,
    state: ExtractionState,
    frames_read: usize,
    kept: Vec<usize>,
    names: Vec<String>,
}

impl Run {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: ExtractionState::Idle,
            frames_read: 0,
            kept: Vec::new(),
            names: Vec::new(),
        }
    }

    fn transition(&mut self, next: ExtractionState) {
        debug!(from = %self.state, to = %next, path = %self.path.display(), "State change");
        self.state = next;
    }
}
