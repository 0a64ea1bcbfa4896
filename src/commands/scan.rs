//! Scan command implementation.
//!
//! Ad-hoc variant: classify a log, rank the top talkers per tag, enrich
//! them and print per-tag tables to stdout. The log is left untouched.

use anyhow::Result;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::enrich::{EnrichedRecord, Enricher};
use crate::rank::rank;
use crate::scanner::Scanner;
use crate::whois::SystemWhois;

const SPINNER_CHARS: [char; 4] = ['|', '/', '-', '\\'];

/// Run the scan command
pub async fn run(log_file: Option<PathBuf>, top: Option<usize>, config_path: &Path) -> Result<()> {
    let Some(log_file) = log_file else {
        // Ad-hoc contract: usage goes to stdout and the exit code is 1.
        println!("Usage: topip scan <logfile> [--top N]");
        std::process::exit(1);
    };

    let config = Config::load_or_default(config_path)?;
    let top_n = top.unwrap_or(config.top_n);

    let scanner = Scanner::new(&config)?;
    let buckets = scanner.scan_file(&log_file)?;

    let whois = Arc::new(SystemWhois::new(config.whois_timeout_secs));
    let enricher = Enricher::new(whois, config.whois_concurrency);

    let interactive = io::stderr().is_terminal();

    for prefix in &config.prefixes {
        let addresses = buckets.addresses(prefix);
        if addresses.is_empty() {
            debug!("No addresses for prefix '{}', skipping table", prefix);
            continue;
        }

        let ranked = rank(addresses, top_n);
        let records = if interactive {
            enricher.enrich(&ranked, Some(&spinner)).await
        } else {
            enricher.enrich(&ranked, None).await
        };

        print_table(prefix, &records);
    }

    Ok(())
}

/// Progress observer rendering a spinner on stderr.
fn spinner(done: usize, total: usize) {
    let frame = SPINNER_CHARS[done % SPINNER_CHARS.len()];
    eprint!("\r{} Fetching whois data... ({}/{})", frame, done, total);
    if done == total {
        eprint!("\r{}\r", " ".repeat(40));
    }
    let _ = io::stderr().flush();
}

fn print_table(prefix: &str, records: &[EnrichedRecord]) {
    println!();
    println!("=== Table for prefix: {} ===", prefix);
    println!(
        "{:<20} {:<7} {:<10} {:<30} {}",
        "IP Address", "Count", "Country", "Netname", "Description"
    );
    println!("{}", "-".repeat(100));
    for record in records {
        println!(
            "{:<20} {:<7} {:<10} {:<30} {}",
            record.ip, record.count, record.country, record.netname, record.description
        );
    }
}
