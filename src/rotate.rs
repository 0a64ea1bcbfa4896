//! Log archival, truncation and retention cleanup.
//!
//! The consumed log is copied aside, compressed into a timestamped gzip
//! archive, and only then truncated, so a failed archive step never costs
//! unarchived data. Old archives are swept by modification time.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Copy the live log to the scratch location.
pub fn copy_to_temp(log: &Path, temp: &Path) -> Result<()> {
    fs::copy(log, temp)
        .with_context(|| format!("Failed to copy {:?} to {:?}", log, temp))?;
    Ok(())
}

/// Compress the scratch copy into a timestamped archive under `backup_dir`.
///
/// Returns the archive path. The archive is verified non-empty before the
/// caller is allowed to truncate the live log.
pub fn archive_copy(temp: &Path, backup_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(backup_dir)
        .with_context(|| format!("Failed to create backup directory: {:?}", backup_dir))?;

    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let archive_path = backup_dir.join(format!("log_copy_{}.log.gz", stamp));

    let input = File::open(temp)
        .with_context(|| format!("Failed to open log copy: {:?}", temp))?;
    let output = File::create(&archive_path)
        .with_context(|| format!("Failed to create archive: {:?}", archive_path))?;

    let mut encoder = GzEncoder::new(output, Compression::default());
    std::io::copy(&mut BufReader::new(input), &mut encoder)
        .context("Failed to compress log copy")?;
    encoder.finish().context("Failed to finalize archive")?;

    let size = fs::metadata(&archive_path)
        .with_context(|| format!("Failed to stat archive: {:?}", archive_path))?
        .len();
    if size == 0 {
        return Err(anyhow!("Archive came out empty: {:?}", archive_path));
    }

    info!("Log copy archived to {:?}", archive_path);
    Ok(archive_path)
}

/// Truncate the live log so subsequent writes start fresh.
pub fn truncate_log(log: &Path) -> Result<()> {
    File::create(log).with_context(|| format!("Failed to truncate log: {:?}", log))?;
    Ok(())
}

/// Age threshold for a retention window expressed in days.
pub fn retention_age(days: u64) -> Duration {
    Duration::from_secs(days * 86_400)
}

/// Delete archives in `backup_dir` older than `max_age` by mtime.
///
/// Per-file failures are logged and skipped; returns the number deleted.
pub fn sweep_old_archives(backup_dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(backup_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read backup directory {:?}: {}", backup_dir, e);
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut deleted = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("gz") {
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok());

        match age {
            Some(age) if age >= max_age => match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Failed to delete {:?}: {}", path, e),
            },
            Some(_) => {}
            None => warn!("Cannot determine age of {:?}, skipping", path),
        }
    }

    if deleted > 0 {
        info!("Deleted {} archives older than {:?}", deleted, max_age);
    } else {
        debug!("No archives older than {:?} found", max_age);
    }

    deleted
}
