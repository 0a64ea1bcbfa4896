//! Registry lookup capability.
//!
//! The lookup is modeled as a trait so the enrichment engine can be tested
//! against a deterministic fake instead of shelling out to the network.
//! The real implementation spawns the system `whois` binary with a hard
//! timeout per invocation.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

/// Field names answering "netname", in priority order.
pub const NETNAME_FIELDS: &[&str] = &["netname", "orgname", "organisation"];

/// Field names answering "description", in priority order.
pub const DESCRIPTION_FIELDS: &[&str] = &[
    "descr",
    "description",
    "organization",
    "org-name",
    "owner",
    "cust-name",
    "comment",
];

/// Field names answering "country".
pub const COUNTRY_FIELDS: &[&str] = &["country"];

/// Trait for registry lookups, allowing dependency injection for testing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WhoisClient: Send + Sync {
    /// Query the registry for an address and return the raw response body.
    ///
    /// Timeouts, spawn failures and non-zero exits are errors; the caller
    /// downgrades them to sentinel values.
    async fn query(&self, ip: &str) -> Result<String>;
}

/// Real implementation that invokes the system `whois` binary.
pub struct SystemWhois {
    timeout: Duration,
}

impl SystemWhois {
    /// Create a client with the given per-invocation timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl WhoisClient for SystemWhois {
    async fn query(&self, ip: &str) -> Result<String> {
        let mut command = Command::new("whois");
        command.arg(ip).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow!("whois {} timed out after {:?}", ip, self.timeout))?
            .map_err(|e| anyhow!("Failed to run whois {}: {}", ip, e))?;

        if !output.status.success() {
            return Err(anyhow!(
                "whois {} exited with status {:?}",
                ip,
                output.status.code()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Extract the first matching field value from a registry response.
///
/// The body is lower-cased, then scanned line by line; for each line the
/// field names are tried in priority order as line prefixes. The value is
/// whatever follows the first colon, trimmed; empty values are skipped.
pub fn extract_field(body: &str, fields: &[&str]) -> Option<String> {
    let lowered = body.to_lowercase();
    for line in lowered.lines() {
        for field in fields {
            if line.starts_with(field) {
                if let Some((_, value)) = line.split_once(':') {
                    let value = value.trim();
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }
    None
}
