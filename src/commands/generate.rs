//! Generate command implementation.
//!
//! Batch variant: consume the log into the dated JSON report, archive the
//! consumed data and truncate the live file, then sweep old archives.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::enrich::Enricher;
use crate::lock::LockGuard;
use crate::rank::rank;
use crate::report::{self, Report};
use crate::rotate;
use crate::scanner::{Scanner, TagBuckets};
use crate::whois::SystemWhois;

/// Run the generate command
pub async fn run(log_file: &Path, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let _lock = LockGuard::acquire(&config.lock_file)?;

    // Snapshot the log; the live file keeps receiving writes meanwhile.
    rotate::copy_to_temp(log_file, &config.temp_copy)?;

    let scanner = Scanner::new(&config)?;
    let buckets = scanner.scan_file(&config.temp_copy)?;

    let whois = Arc::new(SystemWhois::new(config.whois_timeout_secs));
    let enricher = Enricher::new(whois, config.whois_concurrency);

    let report = build_report(&buckets, &config, &enricher).await;
    let path = report::write_report(
        &report,
        &config.data_dir,
        &config.report_owner,
        &config.report_group,
    )?;
    info!("Report written to {:?}", path);

    // Archive before truncating: a failed archive must not cost log data.
    match rotate::archive_copy(&config.temp_copy, &config.backup_dir) {
        Ok(_) => {
            rotate::truncate_log(log_file)?;
            if let Err(e) = fs::remove_file(&config.temp_copy) {
                warn!("Failed to remove log copy {:?}: {}", config.temp_copy, e);
            }
        }
        Err(e) => {
            error!(
                "Failed to archive log copy, leaving {:?} for manual recovery: {}",
                config.temp_copy, e
            );
        }
    }

    rotate::sweep_old_archives(
        &config.backup_dir,
        rotate::retention_age(config.retention_days),
    );

    Ok(())
}

/// Assemble the report: every configured tag, in order, with its ranked
/// and enriched records (empty tags emit empty arrays).
pub async fn build_report(buckets: &TagBuckets, config: &Config, enricher: &Enricher) -> Report {
    let mut report = Report::new();
    for prefix in &config.prefixes {
        let ranked = rank(buckets.addresses(prefix), config.bulk_top_n);
        let records = enricher.enrich(&ranked, None).await;
        report.push(prefix.clone(), records);
    }
    report
}
