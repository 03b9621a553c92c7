// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use shutter::Config;
use shutter::backends::camera::{CameraBackendType, CameraFacing};
use shutter::flash::FlashMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "shutter")]
#[command(about = "Single-screen camera: preview, photo, burst")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera backend (v4l2 or virtual), overrides the config file
    #[arg(long, global = true)]
    backend: Option<CameraBackendType>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (renders camera to terminal)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera to use
        #[arg(short, long, value_enum)]
        facing: Option<FacingArg>,

        /// Flash mode for this photo
        #[arg(long, value_enum)]
        flash: Option<FlashArg>,

        /// Directory to save into (default: ~/Pictures/shutter)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Hold the shutter and capture a burst
    Burst {
        /// How long to hold the shutter, in milliseconds
        #[arg(short, long, default_value = "2000")]
        duration: u64,

        /// Camera to use
        #[arg(short, long, value_enum)]
        facing: Option<FacingArg>,

        /// Directory to save into (default: ~/Pictures/shutter)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the photo the gallery thumbnail shows
    Latest,

    /// Show the configuration
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    Back,
    Front,
}

impl From<FacingArg> for CameraFacing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Back => CameraFacing::Back,
            FacingArg::Front => CameraFacing::Front,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FlashArg {
    Off,
    On,
    Auto,
}

impl From<FlashArg> for FlashMode {
    fn from(arg: FlashArg) -> Self {
        match arg {
            FlashArg::Off => FlashMode::Off,
            FlashArg::On => FlashMode::On,
            FlashArg::Auto => FlashMode::Auto,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=shutter=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_or_default(path),
        None => Config::load(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match cli.command {
        Some(Commands::Terminal) | None => shutter::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo {
            facing,
            flash,
            output_dir,
        }) => {
            apply_overrides(&mut config, facing, output_dir);
            if let Some(flash) = flash {
                config.default_flash_mode = flash.into();
            }
            cli::take_photo(config)
        }
        Some(Commands::Burst {
            duration,
            facing,
            output_dir,
        }) => {
            apply_overrides(&mut config, facing, output_dir);
            cli::take_burst(config, duration)
        }
        Some(Commands::Latest) => cli::print_latest(&config),
        Some(Commands::Config { save }) => cli::show_config(&config, cli.config.as_deref(), save),
    }
}

fn apply_overrides(config: &mut Config, facing: Option<FacingArg>, output_dir: Option<PathBuf>) {
    if let Some(facing) = facing {
        config.default_facing = facing.into();
    }
    if output_dir.is_some() {
        config.photo_dir = output_dir;
    }
}
