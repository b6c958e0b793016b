use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::MultiProgress;
use rayon::prelude::*;
use thermex_core::pipeline::config::{ExtractionConfig, ExtractionMode, OutputFormat};
use thermex_core::pipeline::{CancellationToken, ExtractionSummary, Extractor};
use thermex_core::sink::DirectorySink;
use tracing::info;

use crate::progress::IndicatifReporter;
use crate::summary::{print_extraction_plan, print_extraction_summary, FileReport};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Interval,
    Dynamic,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Png,
    Jpeg,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Input files (.seq, .gif or a video container)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Image format of the extracted frames
    #[arg(long, value_enum)]
    pub output_format: Option<FormatArg>,

    /// Folder that receives `frames/` (defaults to the current directory)
    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    /// Frame retention mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Keep every N-th frame (interval mode)
    #[arg(long)]
    pub interval: Option<usize>,

    /// Equal-pixel ratio below which a frame counts as changed (dynamic mode)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Extraction config file (TOML); flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Process input files in parallel
    #[arg(long)]
    pub parallel: bool,
}

pub fn run(args: &ExtractArgs) -> Result<()> {
    let config = build_config(args)?;
    config.validate().context("Invalid extraction config")?;

    let base = match args.output_folder {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };
    let frames_dir = base.join("frames");

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, stopping after the current frame...");
        handler_token.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    print_extraction_plan(&config, &args.inputs, &frames_dir);

    let multi = MultiProgress::new();
    let jobs: Vec<(&PathBuf, PathBuf)> = args
        .inputs
        .iter()
        .zip(output_dirs(&frames_dir, &args.inputs))
        .collect();
    let extract_one = |(input, output): &(&PathBuf, PathBuf)| {
        let outcome = extract_file(&config, &cancel, &multi, input, output);
        FileReport {
            input: input.to_path_buf(),
            output: output.clone(),
            outcome,
        }
    };

    let reports: Vec<FileReport> = if args.parallel {
        jobs.par_iter().map(extract_one).collect()
    } else {
        jobs.iter().map(extract_one).collect()
    };

    print_extraction_summary(&frames_dir, &reports);

    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, reports.len());
    }
    Ok(())
}

fn extract_file(
    config: &ExtractionConfig,
    cancel: &CancellationToken,
    multi: &MultiProgress,
    input: &Path,
    output: &Path,
) -> Result<ExtractionSummary> {
    let label = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let reporter = Arc::new(IndicatifReporter::new(multi, label));
    info!(input = %input.display(), output = %output.display(), "Extracting");

    let extractor = Extractor::new(config.clone())?
        .with_reporter(reporter.clone())
        .with_cancellation(cancel.clone());

    let result = DirectorySink::create(output)
        .with_context(|| format!("Cannot create {}", output.display()))
        .and_then(|mut sink| {
            extractor
                .extract(input, &mut sink)
                .with_context(|| format!("Failed to extract {}", input.display()))
        });

    if let Err(ref e) = result {
        reporter.fail(&e.root_cause().to_string());
    }
    result
}

/// One output folder per input, aligned with `inputs`.
///
/// A single input writes straight into `frames/`. Several inputs each get
/// `frames/<stem>/`; repeated stems are suffixed `-2`, `-3`, ... so no two
/// inputs share a folder.
fn output_dirs(frames_dir: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    if inputs.len() <= 1 {
        return inputs.iter().map(|_| frames_dir.to_path_buf()).collect();
    }

    let mut taken: HashSet<String> = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            let mut name = stem.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem}-{n}");
                n += 1;
            }
            frames_dir.join(name)
        })
        .collect()
}

fn build_config(args: &ExtractArgs) -> Result<ExtractionConfig> {
    let mut config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid extraction config")?
    } else {
        ExtractionConfig::default()
    };

    if let Some(mode) = args.mode {
        config.mode = match mode {
            ModeArg::Interval => ExtractionMode::Interval,
            ModeArg::Dynamic => ExtractionMode::Dynamic,
        };
    }
    if let Some(interval) = args.interval {
        config.interval = interval;
    }
    if let Some(threshold) = args.threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(format) = args.output_format {
        config.output_format = match format {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Jpeg => OutputFormat::Jpeg,
        };
    }

    Ok(config)
}
