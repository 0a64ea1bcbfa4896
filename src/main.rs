//! TopIP - Firewall Log Top-Talker Reports
//!
//! Scans firewall logs, ranks the IPs behind each tag prefix and enriches
//! the top talkers with WHOIS registry data.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use topip::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Scan { log_file, top } => {
            topip::commands::scan::run(log_file, top, &cli.config).await
        }
        Commands::Generate { log_file } => {
            topip::commands::generate::run(&log_file, &cli.config).await
        }
        Commands::Version => {
            println!("topip {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
