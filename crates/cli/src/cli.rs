//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Driver Rating - driving event detection and trip scoring
#[derive(Parser, Debug)]
#[command(
    name = "driver-rating",
    author,
    version,
    about = "Driving event detection and trip scoring",
    long_about = "Scores a trip from motion and position samples.\n\n\
                  Replays a recorded trip (or a built-in scripted one), detects \n\
                  braking, rash driving, zig-zag and overspeeding events, and \n\
                  dispatches every scored event to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DRIVER_RATING_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DRIVER_RATING_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a trip
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display thresholds, zones and sinks
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "DRIVER_RATING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replay a JSON-lines trip recording instead of the scripted demo trip
    #[arg(long, env = "DRIVER_RATING_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded cadence)
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Restart the trip when it ends (runs until a limit or Ctrl+C)
    #[arg(long = "loop")]
    pub loop_playback: bool,

    /// Feed samples as fast as possible instead of at their recorded cadence
    #[arg(long)]
    pub no_pacing: bool,

    /// Stop after this many events (0 = unlimited)
    #[arg(long, default_value = "0", env = "DRIVER_RATING_MAX_EVENTS")]
    pub max_events: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "DRIVER_RATING_TIMEOUT")]
    pub timeout: u64,

    /// Channel buffer size for internal queues
    #[arg(long, default_value = "256", env = "DRIVER_RATING_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DRIVER_RATING_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show every road zone
    #[arg(long)]
    pub zones: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
