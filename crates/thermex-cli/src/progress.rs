use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use thermex_core::pipeline::ProgressReporter;

/// Drives one indicatif bar per extracted file.
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    pub fn new(multi: &MultiProgress, label: String) -> Self {
        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(frame_style());
        bar.set_message(label);
        Self { bar }
    }

    /// Leave the bar on screen with an error note.
    pub fn fail(&self, reason: &str) {
        self.bar.abandon_with_message(format!("{} (failed: {reason})", self.bar.message()));
    }
}

impl ProgressReporter for IndicatifReporter {
    fn begin(&self, total_frames: Option<usize>) {
        match total_frames {
            Some(total) => self.bar.set_length(total as u64),
            None => self.bar.unset_length(),
        }
    }

    fn advance(&self, frames_done: usize) {
        // Video frame counts are estimates; never let the bar overflow.
        let done = frames_done as u64;
        if self.bar.length().is_some_and(|len| done > len) {
            self.bar.set_length(done);
        }
        self.bar.set_position(done);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

fn frame_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:24} [{bar:40}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
