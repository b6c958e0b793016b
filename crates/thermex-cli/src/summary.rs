use std::path::{Path, PathBuf};

use console::Style;
use thermex_core::pipeline::config::{ExtractionConfig, ExtractionMode};
use thermex_core::pipeline::ExtractionSummary;

/// Outcome of one input file.
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: anyhow::Result<ExtractionSummary>,
}

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    failed: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            failed: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_extraction_plan(config: &ExtractionConfig, inputs: &[PathBuf], output_folder: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Thermex Extraction"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Inputs"),
        s.value.apply_to(inputs.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output_folder.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Format"),
        s.method.apply_to(config.output_format)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(config.mode)
    );
    match config.mode {
        ExtractionMode::Interval => println!(
            "    {:<12}{}",
            s.label.apply_to("Every"),
            s.value.apply_to(format!("{} frame(s)", config.interval))
        ),
        ExtractionMode::Dynamic => println!(
            "    {:<12}{}",
            s.label.apply_to("Threshold"),
            s.value.apply_to(format!("{:.0}% equal", config.similarity_threshold * 100.0))
        ),
    }
    println!();
}

/// Completion report. `output_folder` is the `frames` root every file wrote under.
pub fn print_extraction_summary(output_folder: &Path, reports: &[FileReport]) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Results"));
    for report in reports {
        let name = report
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.input.display().to_string());

        match &report.outcome {
            Ok(summary) => {
                println!(
                    "    {:<24}{} of {} frames kept ({}) -> {}",
                    s.value.apply_to(name),
                    s.method.apply_to(summary.kept.len()),
                    summary.frames_read,
                    summary.kind,
                    s.path.apply_to(report.output.display())
                );
            }
            Err(e) => {
                println!(
                    "    {:<24}{} {:#}",
                    s.value.apply_to(name),
                    s.failed.apply_to("failed:"),
                    e
                );
            }
        }
    }

    let succeeded = reports.iter().filter(|r| r.outcome.is_ok()).count();
    let kept: usize = reports
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .map(|summary| summary.kept.len())
        .sum();

    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Files"),
        s.value.apply_to(format!("{succeeded}/{}", reports.len()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(kept)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Saved to"),
        s.path.apply_to(output_folder.display())
    );
    println!();
}
