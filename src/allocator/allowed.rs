//! Pool membership checks.

use super::AddressAllocator;
use crate::models::{AddressKind, Ipv4};
use std::net::Ipv4Addr;

impl<'a> AddressAllocator<'a> {
    /// Is `address` permitted for the given kind and host context.
    ///
    /// An empty pool means no rule is configured and everything passes.
    pub fn is_address_allowed(&self, kind: AddressKind, address: &str, host: Option<&str>) -> bool {
        let allowed = match kind {
            AddressKind::Internal => self.internal_allowed(address.trim(), host),
            AddressKind::Wan => self.wan_allowed(address.trim()),
        };
        log::debug!(
            "is_address_allowed({kind}, {address}, host={}) = {allowed}",
            host.unwrap_or("-")
        );
        allowed
    }

    fn internal_allowed(&self, address: &str, host: Option<&str>) -> bool {
        if self.internal_pool.is_empty() {
            return true;
        }
        let entry = match self.internal_pool.iter().find(|e| e.address.trim() == address) {
            Some(entry) => entry,
            None => return false,
        };
        let context = host.map(str::trim).filter(|h| !h.is_empty());
        match (entry.bound_host(), context) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(bound), Some(host)) => bound.to_lowercase() == host.to_lowercase(),
        }
    }

    fn wan_allowed(&self, address: &str) -> bool {
        let ip: Ipv4Addr = match address.parse() {
            Ok(ip) => ip,
            Err(_) => return false,
        };
        if self.wan_pool.is_empty() {
            return true;
        }
        self.wan_pool
            .iter()
            .filter_map(|entry| Ipv4::new(&entry.subnet).ok())
            .any(|subnet| subnet.contains(ip))
    }
}
