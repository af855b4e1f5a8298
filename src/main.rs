// SPDX-License-Identifier: GPL-3.0-only

use camera_capture::Facing;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-capture")]
#[command(about = "Capture a photo or a short clip, review it, then confirm or retake")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Serve frames from this image instead of the test pattern
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => Facing::Front,
            FacingArg::Back => Facing::Back,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera to use
        #[arg(short, long, value_enum, default_value = "front")]
        facing: FacingArg,

        /// Output file or directory (default: ~/Pictures/Camera)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the photo after saving
        #[arg(long)]
        open: bool,
    },

    /// Record a video
    Video {
        /// Camera to use
        #[arg(short, long, value_enum, default_value = "front")]
        facing: FacingArg,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Output file or directory (default: ~/Pictures/Camera)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record without a microphone track
        #[arg(long)]
        no_audio: bool,

        /// Open the clip after saving
        #[arg(long)]
        open: bool,
    },

    /// Drive a capture session interactively from stdin
    Session {
        /// Directory confirmed files are written to (default: ~/Pictures/Camera)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let source = cli.source.as_deref();

    match cli.command {
        Commands::List => cli::list_cameras(source),
        Commands::Photo {
            facing,
            output,
            open,
        } => cli::take_photo(source, facing.into(), output, open),
        Commands::Video {
            facing,
            duration,
            output,
            no_audio,
            open,
        } => cli::record_video(source, facing.into(), duration, output, !no_audio, open),
        Commands::Session { output } => cli::run_session(source, output),
    }
}
