//! Subnet expansion into candidate host addresses.

use crate::models::{Ipv4, WanPoolEntry};
use itertools::Itertools;
use std::net::Ipv4Addr;

/// Expand a CIDR string into at most `limit` usable host addresses.
///
/// The network and broadcast addresses are never produced, so /31 and /32
/// expand to nothing. Malformed input also expands to nothing.
///
/// # Examples
/// ```
/// use dc_servers::allocator::expand_subnet;
/// let hosts = expand_subnet("10.0.0.0/24", 3);
/// assert_eq!(hosts.len(), 3);
/// assert_eq!(hosts[0].to_string(), "10.0.0.1");
/// ```
pub fn expand_subnet(cidr: &str, limit: usize) -> Vec<Ipv4Addr> {
    let subnet = match Ipv4::new(cidr) {
        Ok(subnet) => subnet,
        Err(e) => {
            log::debug!("expand_subnet({cidr}) skipped: {e}");
            return Vec::new();
        }
    };
    if subnet.size() <= 2 {
        return Vec::new();
    }
    subnet.hosts().take(limit).collect()
}

/// Candidate WAN addresses across the whole pool, in pool order.
///
/// `limit` is a budget shared by all subnets; once it is spent the remaining
/// subnets are not expanded. Overlapping subnets are de-duplicated after
/// collection, so the result can be shorter than the budget.
pub fn wan_candidates(pool: &[WanPoolEntry], limit: usize) -> Vec<Ipv4Addr> {
    let mut candidates: Vec<Ipv4Addr> = Vec::new();
    for entry in pool {
        let remaining = limit.saturating_sub(candidates.len());
        if remaining == 0 {
            break;
        }
        candidates.extend(expand_subnet(&entry.subnet, remaining));
    }
    log::trace!(
        "wan_candidates: {} addresses from {} subnets",
        candidates.len(),
        pool.len()
    );
    candidates.into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(addrs: &[Ipv4Addr]) -> Vec<String> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_expand_small_subnets() {
        assert_eq!(strings(&expand_subnet("10.0.0.0/30", 10)), ["10.0.0.1", "10.0.0.2"]);
        assert!(expand_subnet("10.0.0.0/31", 10).is_empty());
        assert!(expand_subnet("10.0.0.0/32", 10).is_empty());
    }

    #[test]
    fn test_expand_respects_limit() {
        assert_eq!(
            strings(&expand_subnet("10.0.0.0/24", 3)),
            ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
        assert_eq!(expand_subnet("10.0.0.0/24", 512).len(), 254);
        assert!(expand_subnet("10.0.0.0/24", 0).is_empty());
        assert_eq!(expand_subnet("0.0.0.0/0", 4).len(), 4);
    }

    #[test]
    fn test_expand_malformed() {
        assert!(expand_subnet("10.0.0.0", 10).is_empty());
        assert!(expand_subnet("10.0.0.0/33", 10).is_empty());
        assert!(expand_subnet("not-a-subnet/24", 10).is_empty());
        assert!(expand_subnet("", 10).is_empty());
    }

    #[test]
    fn test_wan_candidates_shares_budget() {
        let pool = vec![
            WanPoolEntry::new("8.8.8.0/29"),
            WanPoolEntry::new("9.9.9.0/29"),
        ];
        let all = wan_candidates(&pool, 512);
        assert_eq!(all.len(), 12);
        assert_eq!(all[0].to_string(), "8.8.8.1");
        assert_eq!(all[6].to_string(), "9.9.9.1");

        let capped = wan_candidates(&pool, 8);
        assert_eq!(
            strings(&capped[6..]),
            ["9.9.9.1", "9.9.9.2"],
            "second subnet gets what the first left over"
        );
    }

    #[test]
    fn test_wan_candidates_dedup_and_skip_bad_rows() {
        let pool = vec![
            WanPoolEntry::new("8.8.8.0/30"),
            WanPoolEntry::new("garbage"),
            WanPoolEntry::new("8.8.8.0/29"),
        ];
        assert_eq!(
            strings(&wan_candidates(&pool, 512)),
            ["8.8.8.1", "8.8.8.2", "8.8.8.3", "8.8.8.4", "8.8.8.5", "8.8.8.6"]
        );
    }

    proptest! {
        #[test]
        fn prop_expand_never_yields_network_or_broadcast(
            bits in any::<u32>(),
            mask in 0u8..=32,
            limit in 0usize..600,
        ) {
            let subnet = Ipv4 { addr: Ipv4Addr::from(bits), mask };
            let hosts = expand_subnet(&subnet.to_string(), limit);

            prop_assert!(hosts.len() <= limit);
            prop_assert!(!hosts.contains(&subnet.lo()));
            prop_assert!(!hosts.contains(&subnet.hi()));
            for pair in hosts.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for host in &hosts {
                prop_assert!(subnet.contains(*host));
            }
        }

        #[test]
        fn prop_expand_is_deterministic(bits in any::<u32>(), mask in 16u8..=32) {
            let cidr = Ipv4 { addr: Ipv4Addr::from(bits), mask }.to_string();
            prop_assert_eq!(expand_subnet(&cidr, 64), expand_subnet(&cidr, 64));
        }
    }
}
