// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapcam::Config;
use snapcam::backends::camera::CameraKind;
use snapcam::constants;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

mod cli;

#[derive(Parser)]
#[command(name = "snapcam")]
#[command(about = "Take photos from the terminal")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take a photo
    Photo {
        /// Camera kind to use: back, front or external (default: from config, else any)
        #[arg(short, long)]
        kind: Option<CameraKind>,

        /// Output file or directory (default: ~/Pictures/snapcam/IMG_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The terminal UI owns the screen, so its logs go to a file
    init_logging(cli.command.is_none());

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    match cli.command {
        Some(Commands::List { json }) => cli::list_cameras(&config, json)?,
        Some(Commands::Photo { kind, output }) => cli::take_photo(config, kind, output)?,
        None => snapcam::terminal::run(config)?,
    }

    Ok(())
}

/// Set up tracing
///
/// Set RUST_LOG to control the level, e.g. RUST_LOG=debug or
/// RUST_LOG=snapcam=debug.
fn init_logging(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let log_file = to_file.then(open_log_file).flatten();
    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .init(),
        None if to_file => {
            // Nowhere to write without corrupting the screen
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join(constants::APP_DIR_NAME);
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(constants::LOG_FILE_NAME))
        .ok()
}
