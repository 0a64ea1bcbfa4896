//! Bounded-concurrency WHOIS enrichment with per-run caching.
//!
//! Each ranked address is resolved to {netname, description, country}
//! through up to three independent registry lookups. Lookups run through
//! a bounded worker pool; every failure degrades to the `"N/A"` sentinel
//! and never aborts the run. A per-run cache avoids repeat lookups when
//! the same address appears under several tags.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::rank::RankedEntry;
use crate::whois::{
    extract_field, WhoisClient, COUNTRY_FIELDS, DESCRIPTION_FIELDS, NETNAME_FIELDS,
};

/// Sentinel for a field the registry could not answer.
pub const UNKNOWN: &str = "N/A";

/// Registry metadata for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisInfo {
    pub netname: String,
    pub description: String,
    pub country: String,
}

impl WhoisInfo {
    fn unknown() -> Self {
        Self {
            netname: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }
}

/// A ranked entry joined with its registry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub ip: String,
    pub count: usize,
    pub netname: String,
    pub description: String,
    pub country: String,
}

/// Observer invoked as pooled lookups complete, with (done, total).
///
/// Purely cosmetic; headless callers pass `None`.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Enrichment engine: worker pool plus per-run lookup cache.
pub struct Enricher {
    client: Arc<dyn WhoisClient>,
    cache: Mutex<HashMap<String, WhoisInfo>>,
    concurrency: usize,
}

impl Enricher {
    pub fn new(client: Arc<dyn WhoisClient>, concurrency: usize) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            concurrency: concurrency.max(1),
        }
    }

    /// One registry call, reduced to a single field group.
    async fn field_lookup(&self, ip: &str, fields: &[&str]) -> String {
        match self.client.query(ip).await {
            Ok(body) => extract_field(&body, fields).unwrap_or_else(|| UNKNOWN.to_string()),
            Err(e) => {
                debug!("whois lookup failed for {}: {}", ip, e);
                UNKNOWN.to_string()
            }
        }
    }

    /// Resolve all three field groups for one address.
    async fn fetch(&self, ip: &str) -> WhoisInfo {
        WhoisInfo {
            netname: self.field_lookup(ip, NETNAME_FIELDS).await,
            description: self.field_lookup(ip, DESCRIPTION_FIELDS).await,
            country: self.field_lookup(ip, COUNTRY_FIELDS).await,
        }
    }

    /// Enrich a ranked sequence, returning records in rank order.
    ///
    /// Only addresses missing from the cache are dispatched to the pool;
    /// completion order never affects the output order because results are
    /// keyed back through the cache.
    pub async fn enrich(
        &self,
        entries: &[RankedEntry],
        progress: Option<&ProgressFn>,
    ) -> Vec<EnrichedRecord> {
        let missing: Vec<String> = {
            let cache = self.cache.lock().await;
            let mut missing = Vec::new();
            for entry in entries {
                if !cache.contains_key(&entry.ip) && !missing.contains(&entry.ip) {
                    missing.push(entry.ip.clone());
                }
            }
            missing
        };

        let total = missing.len();
        let done = AtomicUsize::new(0);

        let fetched: Vec<(String, WhoisInfo)> = stream::iter(missing.into_iter().map(|ip| {
            let done = &done;
            async move {
                let info = self.fetch(&ip).await;
                let completed = done.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(callback) = progress {
                    callback(completed, total);
                }
                (ip, info)
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let mut cache = self.cache.lock().await;
        for (ip, info) in fetched {
            cache.insert(ip, info);
        }

        entries
            .iter()
            .map(|entry| {
                let info = cache
                    .get(&entry.ip)
                    .cloned()
                    .unwrap_or_else(WhoisInfo::unknown);
                EnrichedRecord {
                    ip: entry.ip.clone(),
                    count: entry.count,
                    netname: info.netname,
                    description: info.description,
                    country: info.country,
                }
            })
            .collect()
    }
}
