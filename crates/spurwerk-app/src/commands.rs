// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each returns a printable report so `main` owns
// all terminal output.

use spurwerk_bridge::{FrameLimit, FrameLoop, ImageFileSink, ImageFileSource, KeyStop, RunSummary};
use spurwerk_core::config::{BlurPolicy, PipelineConfig, Weighting};
use spurwerk_core::error::Result;
use spurwerk_detect::LanePipeline;
use tracing::info;

use crate::cli::{ConfigArgs, DetectArgs};

/// Configuration from the optional file with command-line overrides applied.
pub fn resolve_config(args: &DetectArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading pipeline configuration");
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };
    if args.apply_blur {
        config.edge.blur_policy = BlurPolicy::Apply;
    }
    if args.length_weighted {
        config.aggregation.weighting = Weighting::LengthWeighted;
    }
    Ok(config)
}

/// `spurwerk detect`: run the frame loop from image files to PNG output.
pub fn detect(args: &DetectArgs) -> Result<RunSummary> {
    let pipeline = LanePipeline::new(resolve_config(args)?)?;
    let mut source = ImageFileSource::open(&args.input)?;
    let mut sink = ImageFileSink::create(&args.output)?;

    let mut frame_loop = FrameLoop::new(pipeline);
    if let Some(limit) = args.max_frames {
        frame_loop = frame_loop.with_stop(FrameLimit(limit));
    }
    if args.interactive {
        eprintln!("Press q then Enter to stop.");
        frame_loop = frame_loop.with_stop(KeyStop::spawn()?);
    }

    frame_loop.run(&mut source, &mut sink)
}

/// Human-readable or JSON rendering of a run summary.
pub fn format_summary(summary: &RunSummary, json: bool) -> Result<String> {
    if json {
        let value = serde_json::json!({
            "frames_processed": summary.frames_processed,
            "complete_frames": summary.complete_frames,
            "frames_with_absent_side": summary.frames_with_absent_side,
            "frames_failed": summary.frames_failed,
            "stop_reason": summary.stop_reason.to_string(),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    Ok(format!(
        "{} frame(s) processed ({} with both lanes, {} with a missing side), {} skipped; {}",
        summary.frames_processed,
        summary.complete_frames,
        summary.frames_with_absent_side,
        summary.frames_failed,
        summary.stop_reason
    ))
}

/// `spurwerk config`: the default configuration as pretty JSON, or a
/// confirmation that the given file is valid.
pub fn config(args: &ConfigArgs) -> Result<String> {
    match &args.check {
        Some(path) => {
            PipelineConfig::load(path)?;
            Ok(format!("{}: valid", path.display()))
        }
        None => PipelineConfig::default().to_json_pretty(),
    }
}
