use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// remonitor — periodic endpoint monitor
///
/// Probes HTTP and TCP targets on a schedule, tracks their health through
/// a debounced state machine, and dispatches alerts on confirmed changes.
#[derive(Parser, Debug)]
#[command(name = "remonitor")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the monitoring daemon
    #[command(alias = "d")]
    Daemon,

    /// Probe every configured target once and report
    #[command(alias = "c")]
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show tracked target health and recent alerts
    #[command(alias = "s")]
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration without probing
    #[command(alias = "v")]
    Validate,
}
