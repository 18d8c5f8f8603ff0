//! Host and farm tables, internal and WAN pools.

use super::{ServerStore, StoreError};
use crate::models::{InternalIpPoolEntry, Ipv4, LookupEntry, LookupKind, WanPoolEntry};
use chrono::Utc;
use std::net::Ipv4Addr;

impl ServerStore {
    /// Lookup rows of `kind`, ordered by name.
    pub fn lookups(&self, kind: LookupKind) -> &[LookupEntry] {
        match kind {
            LookupKind::Host => &self.data.hosts,
            LookupKind::Farm => &self.data.farms,
        }
    }

    fn lookups_mut(&mut self, kind: LookupKind) -> &mut Vec<LookupEntry> {
        match kind {
            LookupKind::Host => &mut self.data.hosts,
            LookupKind::Farm => &mut self.data.farms,
        }
    }

    /// Add a lookup row, or refresh the row that already has this name.
    pub fn save_lookup(&mut self, kind: LookupKind, name: &str) -> Result<u64, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName { kind });
        }
        let now = Utc::now();
        let entries = self.lookups_mut(kind);

        let id = match entries
            .iter_mut()
            .find(|e| e.name.to_lowercase() == name.to_lowercase())
        {
            Some(existing) => {
                existing.name = name.to_string();
                existing.updated_at = now;
                existing.id
            }
            None => {
                let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
                entries.push(LookupEntry {
                    id,
                    name: name.to_string(),
                    updated_at: now,
                });
                id
            }
        };
        entries.sort_by_key(|e| e.name.to_lowercase());
        log::info!("Saved {kind} '{name}' as id {id}");
        Ok(id)
    }

    /// Remove a lookup row by id.
    pub fn delete_lookup(&mut self, kind: LookupKind, id: u64) -> Result<LookupEntry, StoreError> {
        let entries = self.lookups_mut(kind);
        let index = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::LookupNotFound { kind, id })?;
        let removed = entries.remove(index);
        log::info!("Deleted {kind} {id} '{}'", removed.name);
        Ok(removed)
    }

    pub fn internal_pool(&self) -> &[InternalIpPoolEntry] {
        &self.data.internal_pool
    }

    pub fn wan_pool(&self) -> &[WanPoolEntry] {
        &self.data.wan_pool
    }

    /// Add an internal address, or rebind the host of an existing one.
    pub fn add_internal_pool(&mut self, address: &str, host: Option<&str>) -> Result<(), StoreError> {
        let ip: Ipv4Addr = address
            .trim()
            .parse()
            .map_err(|_| StoreError::InvalidAddress(address.trim().to_string()))?;
        if !self.internal_range.contains(ip) {
            log::warn!(
                "Internal pool address {ip} is outside {}; servers cannot use it",
                self.internal_range
            );
        }

        let entry = InternalIpPoolEntry::new(&ip.to_string(), host);
        let pool = &mut self.data.internal_pool;
        match pool.iter_mut().find(|e| e.address.trim() == entry.address) {
            Some(existing) => existing.host = entry.host.clone(),
            None => pool.push(entry.clone()),
        }
        pool.sort_by_key(|e| e.address.parse::<Ipv4Addr>().ok());
        log::info!(
            "Internal pool: {} bound to {}",
            entry.address,
            entry.host.as_deref().unwrap_or("no host")
        );
        Ok(())
    }

    /// Remove an internal address from the pool.
    pub fn remove_internal_pool(&mut self, address: &str) -> bool {
        let address = address.trim();
        let before = self.data.internal_pool.len();
        self.data
            .internal_pool
            .retain(|e| e.address.trim() != address);
        before != self.data.internal_pool.len()
    }

    /// Add a WAN subnet; an identical subnet already present is left alone.
    pub fn add_wan_subnet(&mut self, cidr: &str) -> Result<(), StoreError> {
        let subnet = Ipv4::new(cidr)
            .map_err(|e| StoreError::InvalidSubnet(cidr.trim().to_string(), e.to_string()))?;
        if subnet.addr != subnet.lo() {
            log::warn!("WAN subnet {subnet} is not aligned; network is {}", subnet.lo());
        }

        let pool = &mut self.data.wan_pool;
        if !pool.iter().any(|e| Ipv4::new(&e.subnet).ok() == Some(subnet)) {
            pool.push(WanPoolEntry::new(&subnet.to_string()));
            pool.sort_by_key(|e| Ipv4::new(&e.subnet).ok());
            log::info!("WAN pool: added {subnet}");
        }
        Ok(())
    }

    /// Remove a WAN subnet from the pool.
    ///
    /// Subnets are compared parsed, so `8.8.8.0/029` removes `8.8.8.0/29`.
    /// Text that does not parse only matches a stored row verbatim.
    pub fn remove_wan_subnet(&mut self, cidr: &str) -> bool {
        let cidr = cidr.trim();
        let target = Ipv4::new(cidr).ok();
        let before = self.data.wan_pool.len();
        self.data.wan_pool.retain(|e| match target {
            Some(target) => Ipv4::new(&e.subnet).ok() != Some(target),
            None => e.subnet.trim() != cidr,
        });
        before != self.data.wan_pool.len()
    }
}
