//! Address pool allocator.
//!
//! Answers three questions over a read-only snapshot of the address pools and
//! the addresses already held by active servers:
//! - [`expand_subnet`] - usable host addresses inside a subnet
//! - [`AddressAllocator::is_address_allowed`] - may this address be used here
//! - [`AddressAllocator::next_free_address`] - which address to suggest next
//!
//! The allocator never mutates anything. A suggestion is not a reservation:
//! two callers holding the same snapshot get the same answer, and the store's
//! write-time duplicate check decides who keeps it.

mod allowed;
mod next_free;
mod subnet;

use crate::config::DEFAULT_EXPAND_LIMIT;
use crate::models::{AddressKind, InternalIpPoolEntry, WanPoolEntry};
use std::collections::HashSet;

pub use next_free::{FreeByHost, HostKey};
pub use subnet::{expand_subnet, wan_candidates};

/// Stateless allocator over borrowed pool snapshots.
#[derive(Debug, Clone)]
pub struct AddressAllocator<'a> {
    internal_pool: &'a [InternalIpPoolEntry],
    wan_pool: &'a [WanPoolEntry],
    in_use_internal: HashSet<String>,
    in_use_wan: HashSet<String>,
    expand_limit: usize,
}

impl<'a> AddressAllocator<'a> {
    /// Create an allocator with nothing marked in use.
    pub fn new(internal_pool: &'a [InternalIpPoolEntry], wan_pool: &'a [WanPoolEntry]) -> Self {
        AddressAllocator {
            internal_pool,
            wan_pool,
            in_use_internal: HashSet::new(),
            in_use_wan: HashSet::new(),
            expand_limit: DEFAULT_EXPAND_LIMIT,
        }
    }

    /// Mark addresses of `kind` as held by active servers.
    pub fn with_in_use<I, S>(mut self, kind: AddressKind, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = match kind {
            AddressKind::Internal => &mut self.in_use_internal,
            AddressKind::Wan => &mut self.in_use_wan,
        };
        set.extend(
            addresses
                .into_iter()
                .map(|a| a.as_ref().trim().to_string())
                .filter(|a| !a.is_empty()),
        );
        self
    }

    /// Override the WAN expansion budget.
    pub fn with_expand_limit(mut self, limit: usize) -> Self {
        self.expand_limit = limit;
        self
    }

    pub fn internal_pool(&self) -> &'a [InternalIpPoolEntry] {
        self.internal_pool
    }

    pub fn wan_pool(&self) -> &'a [WanPoolEntry] {
        self.wan_pool
    }

    /// Addresses of `kind` currently held by active servers.
    pub fn in_use(&self, kind: AddressKind) -> &HashSet<String> {
        match kind {
            AddressKind::Internal => &self.in_use_internal,
            AddressKind::Wan => &self.in_use_wan,
        }
    }

    /// Candidate WAN addresses for this allocator's pool and budget.
    pub fn wan_candidates(&self) -> Vec<std::net::Ipv4Addr> {
        wan_candidates(self.wan_pool, self.expand_limit)
    }
}
