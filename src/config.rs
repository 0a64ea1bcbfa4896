//! Configuration management for TopIP.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag prefixes, in priority order, used to classify log lines
    pub prefixes: Vec<String>,

    /// Addresses and CIDR ranges dropped before counting
    pub exclude_networks: Vec<String>,

    /// Directory receiving the dated JSON reports
    pub data_dir: PathBuf,

    /// Directory receiving compressed log archives
    pub backup_dir: PathBuf,

    /// Scratch location for the working copy of the log
    pub temp_copy: PathBuf,

    /// Lock file preventing concurrent batch runs
    pub lock_file: PathBuf,

    /// Archives older than this many days are deleted
    pub retention_days: u64,

    /// Entries per tag in the interactive tables
    pub top_n: usize,

    /// Entries per tag in the JSON report
    pub bulk_top_n: usize,

    /// Timeout for a single whois invocation
    pub whois_timeout_secs: u64,

    /// Concurrent outstanding whois lookups
    pub whois_concurrency: usize,

    /// Owner set on the emitted report
    pub report_owner: String,

    /// Group set on the emitted report
    pub report_group: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefixes: [
                "blinp_", "blfwd_", "grchc_", "dns_", "invalid_", "private_", "drop_", "icmp_",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude_networks: vec!["192.168.0.0/16".to_string(), "10.0.0.0/24".to_string()],
            data_dir: PathBuf::from("/var/www/topip/data"),
            backup_dir: PathBuf::from("/var/log/topip/backup"),
            temp_copy: PathBuf::from("/tmp/topip_log_copy.txt"),
            lock_file: PathBuf::from("/var/run/topip.lock"),
            retention_days: 10,
            top_n: 10,
            bulk_top_n: 1000,
            whois_timeout_secs: 5,
            whois_concurrency: 10,
            report_owner: "root".to_string(),
            report_group: "apache".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.prefixes.is_empty() {
            anyhow::bail!("At least one tag prefix must be configured");
        }

        if self.prefixes.iter().any(|p| p.is_empty()) {
            anyhow::bail!("Tag prefixes must be non-empty strings");
        }

        if self.retention_days == 0 {
            anyhow::bail!("retention_days must be at least 1");
        }

        if self.whois_concurrency == 0 {
            anyhow::bail!("whois_concurrency must be at least 1");
        }

        if self.whois_timeout_secs == 0 {
            anyhow::bail!("whois_timeout_secs must be at least 1");
        }

        if self.top_n == 0 || self.bulk_top_n == 0 {
            anyhow::bail!("top_n and bulk_top_n must be at least 1");
        }

        Ok(())
    }
}
