mod sim;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use texlink_core::TexlinkConfig;

#[derive(Parser)]
#[command(
    name = "texlink",
    version,
    about = "Texlink — route real-time video frames into UI texture surfaces",
    long_about = "Texlink routes frames delivered by a real-time media engine into texture\n\
                  surfaces owned by a host UI framework, and reports surface changes back to it."
)]
struct Cli {
    /// Path to a texlink.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the controller with synthetic media-engine threads
    Simulate {
        /// Number of capture channels to bind (1-4)
        #[arg(long, default_value_t = 1)]
        channels: usize,

        /// Number of remote streams to bind
        #[arg(long, default_value_t = 1)]
        streams: usize,

        /// Number of media players to bind
        #[arg(long, default_value_t = 0)]
        players: usize,

        /// Frames delivered per source
        #[arg(short, long, default_value_t = 60)]
        frames: u32,

        /// Base frame width in pixels
        #[arg(long, default_value_t = 320)]
        width: u32,

        /// Base frame height in pixels
        #[arg(long, default_value_t = 180)]
        height: u32,

        /// Double the frame size every N frames (0 disables)
        #[arg(long, default_value_t = 0)]
        resize_every: u32,

        /// Enable alpha premultiply on every surface
        #[arg(long)]
        alpha: bool,

        /// Deliver capture frames horizontally flipped
        #[arg(long)]
        mirror: bool,

        /// Feed the last capture channel through the screen-capture path
        #[arg(long)]
        screen_capture: bool,

        /// Delay between frames per source, in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,

        /// Print every UI event as a JSON line
        #[arg(long)]
        events: bool,

        /// Write the final frame of the first player (or first surface) to a PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Display version info
    Info,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration to a file
    Init {
        /// Destination path
        #[arg(default_value = "texlink.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<TexlinkConfig> {
    match path {
        Some(path) => TexlinkConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(TexlinkConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            channels,
            streams,
            players,
            frames,
            width,
            height,
            resize_every,
            alpha,
            mirror,
            screen_capture,
            interval_ms,
            events,
            snapshot,
        } => {
            if width == 0 || height == 0 {
                anyhow::bail!("frame dimensions must be non-zero");
            }
            let opts = sim::SimOptions {
                channels,
                streams,
                players,
                frames,
                width,
                height,
                resize_every,
                alpha,
                mirror,
                screen_capture,
                interval: Duration::from_millis(interval_ms),
                print_events: events,
                snapshot,
            };
            let report = sim::run(config, opts)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", config.to_toml_string()?);
            }
            ConfigCommands::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
                }
                TexlinkConfig::default().save_to_file(&path)?;
                println!("Wrote {}", path.display());
            }
        },

        Commands::Info => {
            println!("texlink {}", env!("CARGO_PKG_VERSION"));
            println!("event channel: {}", config.event_channel.name);
            println!(
                "custom render: {:?} / {:?}",
                config.custom_render.buffer_type, config.custom_render.frame_format_series
            );
        }
    }

    Ok(())
}
