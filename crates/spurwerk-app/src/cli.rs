// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface of the `spurwerk` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "spurwerk")]
#[command(about = "Detect left and right lane boundaries in road camera frames")]
#[command(version)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "debug", "spurwerk_detect=trace").
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Annotate an image or a directory of frames with detected lane lines.
    Detect(DetectArgs),

    /// Print the default pipeline configuration, or validate a config file.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    /// Input image, or a directory of frames processed in file-name order.
    pub input: PathBuf,

    /// Directory that receives the annotated frames as numbered PNGs.
    #[arg(long, short)]
    pub output: PathBuf,

    /// Pipeline configuration (JSON). Defaults are used when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Stop when `q` is entered on standard input.
    #[arg(long)]
    pub interactive: bool,

    /// Feed the Gaussian-smoothed image to the edge detector.
    #[arg(long)]
    pub apply_blur: bool,

    /// Weight each segment by its length when averaging a lane side.
    #[arg(long)]
    pub length_weighted: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Load and validate this file instead of printing the defaults.
    #[arg(long)]
    pub check: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn detect_arguments_parse() {
        let cli = Cli::try_parse_from([
            "spurwerk",
            "detect",
            "frames/",
            "--output",
            "out/",
            "--max-frames",
            "12",
            "--interactive",
            "--length-weighted",
        ])
        .unwrap();

        let Commands::Detect(args) = cli.command else {
            panic!("expected detect subcommand");
        };
        assert_eq!(args.input, PathBuf::from("frames/"));
        assert_eq!(args.output, PathBuf::from("out/"));
        assert_eq!(args.max_frames, Some(12));
        assert!(args.interactive && args.length_weighted);
        assert!(!args.apply_blur && !args.json);
        assert!(args.config.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn detect_requires_output() {
        assert!(Cli::try_parse_from(["spurwerk", "detect", "road.png"]).is_err());
    }

    #[test]
    fn log_level_is_global() {
        let cli = Cli::try_parse_from(["spurwerk", "config", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Config(ConfigArgs { check: None })));
    }
}
