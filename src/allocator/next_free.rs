//! Next-free address selection.

use super::AddressAllocator;
use crate::models::AddressKind;
use std::collections::HashMap;

/// Bucket key for internal addresses: a lower-cased host name, or no host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostKey {
    Unbound,
    Host(String),
}

impl HostKey {
    /// Normalise an optional host name; blank names are unbound.
    pub fn from_host(host: Option<&str>) -> HostKey {
        match host.map(str::trim).filter(|h| !h.is_empty()) {
            Some(h) => HostKey::Host(h.to_lowercase()),
            None => HostKey::Unbound,
        }
    }
}

/// First unused internal address per host bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeByHost {
    by_host: HashMap<HostKey, String>,
    // The first bucket ever filled, which is the first unused pool address.
    first: Option<String>,
}

impl FreeByHost {
    fn offer(&mut self, key: HostKey, address: &str) {
        if self.first.is_none() {
            self.first = Some(address.to_string());
        }
        self.by_host
            .entry(key)
            .or_insert_with(|| address.to_string());
    }

    pub fn get(&self, key: &HostKey) -> Option<&str> {
        self.by_host.get(key).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.first.as_deref()
    }

    pub fn len(&self) -> usize {
        self.by_host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_host.is_empty()
    }

    /// The host's own bucket, else the unbound bucket, else anything free.
    pub fn pick(&self, host: Option<&str>) -> Option<&str> {
        let key = HostKey::from_host(host);
        if key != HostKey::Unbound {
            if let Some(address) = self.get(&key) {
                return Some(address);
            }
        }
        self.get(&HostKey::Unbound).or_else(|| self.first())
    }
}

impl<'a> AddressAllocator<'a> {
    /// Bucket the internal pool by host, keeping the first unused address of each.
    pub fn free_by_host(&self) -> FreeByHost {
        let mut free = FreeByHost::default();
        for entry in self.internal_pool {
            let address = entry.address.trim();
            if self.in_use_internal.contains(address) {
                continue;
            }
            free.offer(HostKey::from_host(entry.bound_host()), address);
        }
        free
    }

    /// Suggest the next unused address of `kind`.
    ///
    /// Only reads the snapshot; calling it twice gives the same answer.
    pub fn next_free_address(&self, kind: AddressKind, host: Option<&str>) -> Option<String> {
        let next = match kind {
            AddressKind::Internal => self.free_by_host().pick(host).map(str::to_string),
            AddressKind::Wan => self
                .wan_candidates()
                .into_iter()
                .map(|ip| ip.to_string())
                .find(|ip| !self.in_use_wan.contains(ip)),
        };
        log::debug!(
            "next_free_address({kind}, host={}) = {}",
            host.unwrap_or("-"),
            next.as_deref().unwrap_or("none")
        );
        next
    }
}
