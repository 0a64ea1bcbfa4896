//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "topip")]
#[command(author, version, about = "Top-talker reports from firewall logs")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "/etc/topip/config.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (for cron/systemd timer)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a log file and print per-tag top-talker tables
    Scan {
        /// Log file to scan
        log_file: Option<PathBuf>,

        /// Number of top IPs per tag (default from config)
        #[arg(long, short)]
        top: Option<usize>,
    },

    /// Generate the daily JSON report and rotate the log
    Generate {
        /// Log file to consume
        #[arg(default_value = "log.txt")]
        log_file: PathBuf,
    },

    /// Show version
    Version,
}
