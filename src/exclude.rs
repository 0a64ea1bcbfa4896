//! Exclusion filter for literal addresses and CIDR ranges.
//!
//! Compiled once from configuration, then queried read-only for every
//! address the scanner extracts. Addresses that do not parse as IPv4 are
//! treated as excluded so malformed matches never reach the counters.

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;
use tracing::warn;

/// Compiled exclusion list.
///
/// Each configured entry is either an exact IPv4 address (matched as /32)
/// or a CIDR range. Entries that parse as neither are skipped with a
/// warning at compile time, never at query time.
#[derive(Debug, Clone, Default)]
pub struct ExcludeList {
    networks: Vec<Ipv4Net>,
}

impl ExcludeList {
    /// Compile the configured entries into a queryable list.
    pub fn compile(entries: &[String]) -> Self {
        let mut networks = Vec::with_capacity(entries.len());
        for entry in entries {
            match parse_entry(entry) {
                Some(net) => networks.push(net),
                None => warn!("Invalid IP or network in exclude_networks: {}", entry),
            }
        }
        Self { networks }
    }

    /// Whether the given address string is excluded.
    ///
    /// An address that does not parse as a valid IPv4 literal is excluded.
    pub fn is_excluded(&self, addr: &str) -> bool {
        let ip: Ipv4Addr = match addr.parse() {
            Ok(ip) => ip,
            Err(_) => return true,
        };
        self.networks.iter().any(|net| net.contains(&ip))
    }

    /// Number of compiled entries (invalid ones are not counted).
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Whether no entries survived compilation.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

/// Parse one entry as a CIDR range or a bare address promoted to /32.
///
/// CIDR entries may carry host bits ("10.0.0.1/24" matches the whole /24).
fn parse_entry(entry: &str) -> Option<Ipv4Net> {
    if entry.contains('/') {
        entry.parse().ok()
    } else {
        let ip: Ipv4Addr = entry.parse().ok()?;
        Ipv4Net::new(ip, 32).ok()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every address inside a configured /24 is filtered out
        #[test]
        fn prop_cidr_members_excluded(last in 0u8..=255) {
            let list = ExcludeList::compile(&["10.0.0.0/24".to_string()]);
            let addr = format!("10.0.0.{}", last);
            prop_assert!(list.is_excluded(&addr));
        }

        /// A literal entry only matches itself
        #[test]
        fn prop_literal_matches_exactly(a in 1u8..=254, b in 0u8..=255) {
            let list = ExcludeList::compile(&["203.0.113.7".to_string()]);
            let addr = format!("203.0.{}.{}", b, a);
            let expected = addr == "203.0.113.7";
            prop_assert_eq!(list.is_excluded(&addr), expected);
        }

        /// Valid addresses are never excluded by an empty list
        #[test]
        fn prop_empty_list_retains(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
            let list = ExcludeList::compile(&[]);
            let addr = format!("{}.{}.{}.{}", a, b, c, d);
            prop_assert!(!list.is_excluded(&addr));
        }
    }
}
