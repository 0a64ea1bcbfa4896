//! JSON report emission.
//!
//! The report maps each configured tag, in configured order, to its ranked
//! and enriched records. One file per local calendar day; reruns on the
//! same day overwrite it. The file is written atomically, then restricted
//! to owner/group read-only and handed to the configured owner:group so a
//! separate viewer process can serve it.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ffi::CString;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::enrich::EnrichedRecord;

/// Mode of the emitted report: owner/group read-only.
const REPORT_MODE: u32 = 0o440;

/// Ordered tag → records mapping for one run.
///
/// Insertion order is the configured prefix order and is preserved through
/// serialization; tags without matches carry empty arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    sections: Vec<(String, Vec<EnrichedRecord>)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag section. Call in configured prefix order.
    pub fn push(&mut self, tag: impl Into<String>, records: Vec<EnrichedRecord>) {
        self.sections.push((tag.into(), records));
    }

    pub fn sections(&self) -> &[(String, Vec<EnrichedRecord>)] {
        &self.sections
    }

    /// Records for one tag, if the tag is present.
    pub fn records(&self, tag: &str) -> Option<&[EnrichedRecord]> {
        self.sections
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, records)| records.as_slice())
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (tag, records) in &self.sections {
            map.serialize_entry(tag, records)?;
        }
        map.end()
    }
}

/// File name for a report emitted today: `YYYY-MM-DD.json` in local time.
pub fn report_filename() -> String {
    format!("{}.json", Local::now().format("%Y-%m-%d"))
}

/// Serialize the report and write it under `data_dir`.
///
/// The directory is created if absent (failure is fatal). The write goes
/// through a temporary file renamed into place so a crash never leaves a
/// partial report. Ownership failures only warn; the report stays written
/// with default ownership.
pub fn write_report(report: &Report, data_dir: &Path, owner: &str, group: &str) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let path = data_dir.join(report_filename());
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

    let mut temp_file = NamedTempFile::new_in(data_dir)
        .context("Failed to create temporary file for report")?;
    temp_file
        .write_all(json.as_bytes())
        .context("Failed to write report")?;
    temp_file.flush().context("Failed to flush report")?;
    temp_file
        .persist(&path)
        .with_context(|| format!("Failed to move report into place: {:?}", path))?;

    fs::set_permissions(&path, fs::Permissions::from_mode(REPORT_MODE))
        .context("Failed to set report permissions")?;

    if let Err(e) = set_ownership(&path, owner, group) {
        warn!("Failed to set report ownership {}:{}: {}", owner, group, e);
    }

    Ok(path)
}

/// Hand the file to the configured user and group.
fn set_ownership(path: &Path, user: &str, group: &str) -> Result<()> {
    use std::os::unix::ffi::OsStrExt;

    let uid = lookup_uid(user).ok_or_else(|| anyhow!("Unknown user: {}", user))?;
    let gid = lookup_gid(group).ok_or_else(|| anyhow!("Unknown group: {}", group))?;

    let c_path = CString::new(path.as_os_str().as_bytes()).context("Path contains NUL byte")?;
    let result = unsafe { libc::chown(c_path.as_ptr(), uid, gid) };
    if result != 0 {
        return Err(anyhow!(
            "chown failed: {}",
            std::io::Error::last_os_error()
        ));
    }
    Ok(())
}

fn lookup_uid(name: &str) -> Option<libc::uid_t> {
    let c_name = CString::new(name).ok()?;
    let passwd = unsafe { libc::getpwnam(c_name.as_ptr()) };
    if passwd.is_null() {
        None
    } else {
        Some(unsafe { (*passwd).pw_uid })
    }
}

fn lookup_gid(name: &str) -> Option<libc::gid_t> {
    let c_name = CString::new(name).ok()?;
    let group = unsafe { libc::getgrnam(c_name.as_ptr()) };
    if group.is_null() {
        None
    } else {
        Some(unsafe { (*group).gr_gid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(ip: &str, count: usize) -> EnrichedRecord {
        EnrichedRecord {
            ip: ip.to_string(),
            count,
            netname: "net".to_string(),
            description: "desc".to_string(),
            country: "nl".to_string(),
        }
    }

    fn sample_report() -> Report {
        let mut report = Report::new();
        report.push("blinp_", vec![]);
        report.push("grchc_", vec![record("8.8.8.8", 1), record("1.1.1.1", 1)]);
        report.push("dns_", vec![record("9.9.9.9", 4)]);
        report
    }

    #[test]
    fn test_tag_order_preserved_in_json() {
        let json = serde_json::to_string_pretty(&sample_report()).unwrap();
        let blinp = json.find("\"blinp_\"").unwrap();
        let grchc = json.find("\"grchc_\"").unwrap();
        let dns = json.find("\"dns_\"").unwrap();
        assert!(blinp < grchc && grchc < dns);
    }

    #[test]
    fn test_record_order_preserved_in_json() {
        let json = serde_json::to_string_pretty(&sample_report()).unwrap();
        assert!(json.find("8.8.8.8").unwrap() < json.find("1.1.1.1").unwrap());
    }

    #[test]
    fn test_empty_tag_serializes_as_empty_array() {
        let json = serde_json::to_string(&sample_report()).unwrap();
        assert!(json.contains("\"blinp_\":[]"));
    }

    #[test]
    fn test_round_trip_recovers_counts_and_order() {
        let json = serde_json::to_string_pretty(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let grchc = value["grchc_"].as_array().unwrap();
        assert_eq!(grchc.len(), 2);
        assert_eq!(grchc[0]["ip"], "8.8.8.8");
        assert_eq!(grchc[0]["count"], 1);
        assert_eq!(grchc[1]["ip"], "1.1.1.1");
        assert_eq!(value["dns_"][0]["count"], 4);
        assert_eq!(value["blinp_"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_write_report_creates_dated_file() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");

        let path = write_report(&sample_report(), &data_dir, "no-such-user", "no-such-group")
            .unwrap();

        assert_eq!(path, data_dir.join(report_filename()));
        assert!(path.exists());

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, REPORT_MODE);
    }

    #[test]
    fn test_same_day_rerun_overwrites() {
        let dir = TempDir::new().unwrap();

        let mut first = Report::new();
        first.push("blinp_", vec![record("1.2.3.4", 1)]);
        write_report(&first, dir.path(), "no-such-user", "no-such-group").unwrap();

        let mut second = Report::new();
        second.push("blinp_", vec![record("5.6.7.8", 2)]);
        let path = write_report(&second, dir.path(), "no-such-user", "no-such-group").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("5.6.7.8"));
        assert!(!content.contains("1.2.3.4"));

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_unknown_owner_does_not_fail_the_write() {
        let dir = TempDir::new().unwrap();
        let result = write_report(&sample_report(), dir.path(), "no-such-user", "no-such-group");
        assert!(result.is_ok());
    }
}
