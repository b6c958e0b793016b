use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use thermex_core::source::FrameSource;

#[derive(Args)]
pub struct InfoArgs {
    /// Input file (.seq, .gif or a video container)
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let source = FrameSource::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let info = source.source_info();
    source.close();

    println!("File:        {}", info.filename.display());
    println!("Container:   {}", info.kind);
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);

    if !info.units.is_empty() {
        let units: Vec<String> = info.units.iter().map(|u| u.to_string()).collect();
        println!("Units:       {}", units.join(", "));
    }
    if let Some(ref cal) = info.calibration {
        println!(
            "Calibration: R1={} R2={} B={} F={} O={}",
            cal.r1, cal.r2, cal.b, cal.f, cal.o
        );
    }
    if let Some(ref model) = info.camera_model {
        println!("Camera:      {}", model);
    }

    Ok(())
}
