//! # TopIP - Firewall Log Top-Talker Reports
//!
//! Scans a firewall/router log, classifies lines by a configured set of
//! tag prefixes, counts the IPv4 addresses embedded in matching lines,
//! enriches the most frequent addresses with WHOIS registry metadata and
//! emits a dated JSON report. The consumed log is archived and truncated
//! so the next run starts from a fresh file.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         TopIP                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: scan, generate, version                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── Prefixes, exclusions, directories, retention         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scanner (regex + ipnet)                                    │
//! │    ├── First-prefix-wins line classification                │
//! │    └── Dotted-quad extraction with exclusion filter         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Ranking                                                    │
//! │    └── Descending frequency, stable first-seen tie-break    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Enricher (WhoisClient trait)                               │
//! │    ├── Bounded worker pool with per-run cache               │
//! │    └── netname / description / country, "N/A" on failure    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Report (serde_json) + Rotation (flate2)                    │
//! │    └── Dated JSON, gzip archive, retention sweep            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use topip::config::Config;
//! use topip::enrich::Enricher;
//! use topip::rank::rank;
//! use topip::scanner::Scanner;
//! use topip::whois::SystemWhois;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("/etc/topip/config.yaml".as_ref())?;
//!
//!     // Classify the log and extract addresses per tag
//!     let scanner = Scanner::new(&config)?;
//!     let buckets = scanner.scan_file("log.txt".as_ref())?;
//!
//!     // Enrich the top talkers of one tag
//!     let whois = Arc::new(SystemWhois::new(config.whois_timeout_secs));
//!     let enricher = Enricher::new(whois, config.whois_concurrency);
//!     for prefix in &config.prefixes {
//!         let ranked = rank(buckets.addresses(prefix), config.top_n);
//!         let records = enricher.enrich(&ranked, None).await;
//!         println!("{}: {} entries", prefix, records.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`enrich`] - Bounded-concurrency WHOIS enrichment with caching
//! - [`exclude`] - Exclusion filter for literal addresses and CIDR ranges
//! - [`lock`] - File locking for concurrent execution prevention
//! - [`rank`] - Frequency ranking of extracted addresses
//! - [`report`] - JSON report emission with restrictive ownership
//! - [`rotate`] - Log archival, truncation and retention cleanup
//! - [`scanner`] - Line classification and IPv4 extraction
//! - [`whois`] - Registry lookup capability (external `whois` binary)

pub mod cli;
pub mod commands;
pub mod config;
pub mod enrich;
pub mod exclude;
pub mod lock;
pub mod rank;
pub mod report;
pub mod rotate;
pub mod scanner;
pub mod whois;

pub use cli::{Cli, Commands};
pub use config::Config;
