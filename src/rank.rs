//! Frequency ranking of extracted addresses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One ranked address with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub ip: String,
    pub count: usize,
}

/// Rank addresses by descending frequency, keeping at most `top_n`.
///
/// Counting is by exact string equality ("192.168.001.1" and
/// "192.168.1.1" are distinct keys). Ties keep the relative order of
/// first appearance in the input.
pub fn rank(addresses: &[String], top_n: usize) -> Vec<RankedEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for addr in addresses {
        let entry = counts.entry(addr.as_str()).or_insert(0);
        if *entry == 0 {
            first_seen.push(addr.as_str());
        }
        *entry += 1;
    }

    let mut ranked: Vec<RankedEntry> = first_seen
        .into_iter()
        .map(|ip| RankedEntry {
            ip: ip.to_string(),
            count: counts[ip],
        })
        .collect();

    // Stable sort preserves first-seen order among equal counts
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(top_n);
    ranked
}
