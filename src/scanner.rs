//! Line classification and IPv4 extraction.
//!
//! A line belongs to at most one tag: tokens are scanned left to right and
//! the first token starting with any configured prefix decides the tag,
//! with prefixes tested in configured priority order per token. Matching
//! lines then contribute every dotted-quad substring they contain, in
//! order of appearance, minus excluded ones.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::exclude::ExcludeList;

/// Dotted-quad pattern. Syntactic only: octets above 255 still match and
/// are left to the exclusion filter, which drops unparseable addresses.
const IP_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";

/// Per-tag address buckets accumulated during a single scan pass.
///
/// Duplicates are kept and per-tag insertion order is preserved; ranking
/// depends on both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagBuckets {
    buckets: HashMap<String, Vec<String>>,
}

impl TagBuckets {
    /// Addresses collected for a tag, in order of appearance.
    pub fn addresses(&self, prefix: &str) -> &[String] {
        self.buckets.get(prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of collected addresses across all tags.
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    fn push(&mut self, prefix: &str, addr: String) {
        self.buckets.entry(prefix.to_string()).or_default().push(addr);
    }
}

/// Log line classifier and extractor.
pub struct Scanner {
    prefixes: Vec<String>,
    exclude: ExcludeList,
    ip_pattern: Regex,
}

impl Scanner {
    /// Build a scanner from the configured prefixes and exclusions.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_rules(
            config.prefixes.clone(),
            ExcludeList::compile(&config.exclude_networks),
        )
    }

    /// Build a scanner from explicit rules.
    pub fn with_rules(prefixes: Vec<String>, exclude: ExcludeList) -> Result<Self> {
        let ip_pattern = Regex::new(IP_PATTERN).context("Failed to compile IP pattern")?;
        Ok(Self {
            prefixes,
            exclude,
            ip_pattern,
        })
    }

    /// The tag for a line, if any.
    ///
    /// Tokens are scanned left to right; the first token that starts with
    /// any configured prefix wins, with prefixes tried in priority order
    /// for each token.
    pub fn match_prefix<'a>(&'a self, line: &str) -> Option<&'a str> {
        for word in line.split_whitespace() {
            for prefix in &self.prefixes {
                if word.starts_with(prefix.as_str()) {
                    return Some(prefix);
                }
            }
        }
        None
    }

    /// Classify one line and append its surviving addresses to `buckets`.
    pub fn scan_line(&self, line: &str, buckets: &mut TagBuckets) {
        let Some(prefix) = self.match_prefix(line) else {
            return;
        };
        for m in self.ip_pattern.find_iter(line) {
            let addr = m.as_str();
            if !self.exclude.is_excluded(addr) {
                buckets.push(prefix, addr.to_string());
            }
        }
    }

    /// Scan every line of a reader into fresh buckets.
    ///
    /// Lines are decoded lossily, so invalid UTF-8 in the log never aborts
    /// the run.
    pub fn scan_reader<R: BufRead>(&self, mut reader: R) -> Result<TagBuckets> {
        let mut buckets = TagBuckets::default();
        let mut raw = Vec::new();
        loop {
            raw.clear();
            let n = reader
                .read_until(b'\n', &mut raw)
                .context("Failed to read log line")?;
            if n == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&raw);
            self.scan_line(&line, &mut buckets);
        }

        for prefix in &self.prefixes {
            debug!(
                "Found {} addresses for prefix '{}'",
                buckets.addresses(prefix).len(),
                prefix
            );
        }

        Ok(buckets)
    }

    /// Scan a log file into fresh buckets.
    pub fn scan_file(&self, path: &Path) -> Result<TagBuckets> {
        let file =
            File::open(path).with_context(|| format!("Failed to open log file: {:?}", path))?;
        self.scan_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(prefixes: &[&str], exclude: &[&str]) -> Scanner {
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        Scanner::with_rules(
            prefixes.iter().map(|s| s.to_string()).collect(),
            ExcludeList::compile(&exclude),
        )
        .unwrap()
    }

    fn scan(s: &Scanner, input: &str) -> TagBuckets {
        s.scan_reader(input.as_bytes()).unwrap()
    }

    #[test]
    fn test_line_contributes_to_single_bucket() {
        let s = scanner(&["blinp_", "grchc_"], &[]);
        // Both prefixes appear; the leftmost matching token wins.
        let buckets = scan(&s, "blinp_rule grchc_rule 1.2.3.4\n");
        assert_eq!(buckets.addresses("blinp_"), ["1.2.3.4"]);
        assert!(buckets.addresses("grchc_").is_empty());
    }

    #[test]
    fn test_token_order_beats_prefix_order() {
        let s = scanner(&["blinp_", "grchc_"], &[]);
        let buckets = scan(&s, "grchc_rule blinp_rule 1.2.3.4\n");
        assert_eq!(buckets.addresses("grchc_"), ["1.2.3.4"]);
        assert!(buckets.addresses("blinp_").is_empty());
    }

    #[test]
    fn test_all_addresses_extracted_in_order() {
        let s = scanner(&["drop_"], &[]);
        let buckets = scan(&s, "drop_fw 10.1.1.1 then 8.8.8.8 then 10.1.1.1\n");
        assert_eq!(buckets.addresses("drop_"), ["10.1.1.1", "8.8.8.8", "10.1.1.1"]);
    }

    #[test]
    fn test_unmatched_line_contributes_nothing() {
        let s = scanner(&["blinp_"], &[]);
        let buckets = scan(&s, "kernel: established 5.6.7.8\n");
        assert_eq!(buckets.total(), 0);
    }

    #[test]
    fn test_prefix_must_lead_a_token() {
        let s = scanner(&["blinp_"], &[]);
        let buckets = scan(&s, "xxblinp_rule 5.6.7.8\n");
        assert_eq!(buckets.total(), 0);
    }

    #[test]
    fn test_excluded_addresses_dropped() {
        let s = scanner(&["blinp_"], &["10.0.0.0/24"]);
        let buckets = scan(&s, "blinp_rule drop 10.0.0.5 8.8.8.8 10.0.0.9\n");
        assert_eq!(buckets.addresses("blinp_"), ["8.8.8.8"]);
    }

    #[test]
    fn test_syntactic_match_semantic_drop() {
        // 999.1.2.3 matches the dotted-quad pattern but cannot parse as
        // IPv4, so the exclusion filter removes it.
        let s = scanner(&["blinp_"], &[]);
        let buckets = scan(&s, "blinp_rule 999.1.2.3 8.8.4.4\n");
        assert_eq!(buckets.addresses("blinp_"), ["8.8.4.4"]);
    }

    #[test]
    fn test_invalid_utf8_tolerated() {
        let s = scanner(&["blinp_"], &[]);
        let mut input = b"blinp_rule \xff\xfe 1.2.3.4\n".to_vec();
        input.extend_from_slice(b"blinp_more 5.6.7.8\n");
        let buckets = s.scan_reader(input.as_slice()).unwrap();
        assert_eq!(buckets.addresses("blinp_"), ["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn test_scan_is_idempotent_over_same_input() {
        let s = scanner(&["blinp_", "drop_"], &["10.0.0.0/24"]);
        let input = "blinp_a 1.1.1.1 10.0.0.2\ndrop_b 2.2.2.2 2.2.2.2\nnoise 3.3.3.3\n";
        let first = scan(&s, input);
        let second = scan(&s, input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let s = scanner(&["blinp_"], &[]);
        assert!(s.scan_file(Path::new("/nonexistent/topip.log")).is_err());
    }
}
