//! JSON-snapshot record store.
//!
//! This module owns everything the allocator reads:
//! - [`servers`] - server CRUD, soft delete and the trash
//! - [`lookups`] - host and farm tables, internal and WAN pools
//! - [`query`] - searching and ordering server listings
//! - [`import`] - bulk insert from already-parsed rows
//!
//! The whole store is one JSON document, loaded and saved as a unit.

mod import;
mod lookups;
mod query;
mod servers;

use crate::allocator::AddressAllocator;
use crate::config::{Settings, DEFAULT_EXPAND_LIMIT};
use crate::models::{
    AddressKind, Customer, InternalIpPoolEntry, Ipv4, LookupEntry, LookupKind, ServerInput,
    ServerRecord, WanPoolEntry,
};
use crate::validation::{validate_server, ValidationContext, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use import::{sanitize_key, ImportDocument, ImportReport, ImportRow};
pub use query::{OrderBy, ServerQuery, ServerRow, SortOrder};

/// Everything persisted in the store file.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct StoreData {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub servers: Vec<ServerRecord>,
    #[serde(default)]
    pub hosts: Vec<LookupEntry>,
    #[serde(default)]
    pub farms: Vec<LookupEntry>,
    #[serde(default)]
    pub internal_pool: Vec<InternalIpPoolEntry>,
    #[serde(default)]
    pub wan_pool: Vec<WanPoolEntry>,
}

/// Why a store operation was refused.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error("server {0} not found")]
    ServerNotFound(u64),
    #[error("{kind} {id} not found")]
    LookupNotFound { kind: LookupKind, id: u64 },
    #[error("{kind} name must not be empty")]
    EmptyName { kind: LookupKind },
    #[error("'{0}' is not a valid IPv4 address")]
    InvalidAddress(String),
    #[error("'{0}' is not a valid subnet: {1}")]
    InvalidSubnet(String, String),
    #[error("no free {0} address left in the pool")]
    NoFreeAddress(AddressKind),
}

/// Read a store file.
///
/// A missing file is an empty store; a malformed one is an error naming the
/// JSON path that failed.
pub fn read_store_file(path: &Path) -> Result<StoreData, Box<dyn Error>> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("Store file not found, starting empty: {}", path.display());
            return Ok(StoreData::default());
        }
        Err(e) => return Err(format!("Error reading store file {}: {e}", path.display()).into()),
    };

    log::info!("Reading store file: {}", path.display());
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    let data: StoreData = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        format!(
            "Error parsing store file {}: path={} error={}",
            path.display(),
            e.path(),
            e
        )
    })?;
    Ok(data)
}

/// Write a store file, replacing it only once the new content is on disk.
pub fn write_store_file(path: &Path, data: &StoreData) -> Result<(), Box<dyn Error>> {
    let json =
        serde_json::to_string_pretty(data).map_err(|e| format!("Error serializing JSON: {e}"))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| format!("Error writing store file {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| format!("Error replacing store file {}: {e}", path.display()))?;
    log::info!("Wrote store file: {}", path.display());
    Ok(())
}

/// Servers, customers, lookups and pools, with the settings that govern them.
#[derive(Debug, Clone)]
pub struct ServerStore {
    data: StoreData,
    path: Option<PathBuf>,
    internal_range: Ipv4,
    expand_limit: usize,
}

impl ServerStore {
    /// An unsaved store over `data` with default settings.
    pub fn in_memory(data: StoreData) -> ServerStore {
        let defaults = Settings::default();
        ServerStore {
            data,
            path: None,
            internal_range: defaults.internal_range,
            expand_limit: DEFAULT_EXPAND_LIMIT,
        }
    }

    /// Open the store file named by `settings`.
    pub fn open(settings: &Settings) -> Result<ServerStore, Box<dyn Error>> {
        ServerStore::open_path(&settings.store_file, settings)
    }

    /// Open a specific store file with the given settings.
    pub fn open_path(path: &Path, settings: &Settings) -> Result<ServerStore, Box<dyn Error>> {
        let data = read_store_file(path)?;
        log::info!(
            "Store loaded: {} servers, {} customers, {} internal pool, {} WAN subnets",
            data.servers.len(),
            data.customers.len(),
            data.internal_pool.len(),
            data.wan_pool.len()
        );
        Ok(ServerStore {
            data,
            path: Some(path.to_path_buf()),
            internal_range: settings.internal_range,
            expand_limit: settings.expand_limit,
        })
    }

    /// Persist to the file this store was opened from.
    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        match &self.path {
            Some(path) => write_store_file(path, &self.data),
            None => Err("Store has no file to save to".into()),
        }
    }

    pub fn with_internal_range(mut self, range: Ipv4) -> Self {
        self.internal_range = range;
        self
    }

    pub fn with_expand_limit(mut self, limit: usize) -> Self {
        self.expand_limit = limit;
        self
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn customers(&self) -> &[Customer] {
        &self.data.customers
    }

    pub fn customer(&self, id: u64) -> Option<&Customer> {
        self.data.customers.iter().find(|c| c.id == id)
    }

    /// Insert or replace a customer row, keyed by id.
    pub fn upsert_customer(&mut self, customer: Customer) {
        match self.data.customers.iter_mut().find(|c| c.id == customer.id) {
            Some(existing) => *existing = customer,
            None => self.data.customers.push(customer),
        }
    }

    /// Addresses of `kind` held by active servers.
    pub fn in_use(&self, kind: AddressKind) -> Vec<&str> {
        self.data
            .servers
            .iter()
            .filter(|s| s.is_active())
            .map(|s| match kind {
                AddressKind::Internal => s.ip_internal.as_str(),
                AddressKind::Wan => s.ip_wan.as_str(),
            })
            .collect()
    }

    /// A read-only allocator over the current pools and active servers.
    pub fn allocator(&self) -> AddressAllocator<'_> {
        AddressAllocator::new(&self.data.internal_pool, &self.data.wan_pool)
            .with_in_use(AddressKind::Internal, self.in_use(AddressKind::Internal))
            .with_in_use(AddressKind::Wan, self.in_use(AddressKind::Wan))
            .with_expand_limit(self.expand_limit)
    }

    /// Run server validation against the current state.
    pub fn validate(&self, input: &ServerInput, exclude_id: Option<u64>) -> Result<(), ValidationErrors> {
        let allocator = self.allocator();
        let ctx = ValidationContext {
            allocator: &allocator,
            servers: &self.data.servers,
            internal_range: self.internal_range,
        };
        validate_server(input, exclude_id, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_store_file() {
        let data = read_store_file(Path::new("src/tests/test_data/store_test_01.json"))
            .expect("Error reading store file");
        assert_eq!(data.customers.len(), 2);
        assert_eq!(data.servers.len(), 3);
        assert_eq!(data.internal_pool.len(), 5);
        assert_eq!(data.wan_pool[0].subnet, "8.8.8.0/29");
    }

    #[test]
    fn test_read_missing_store_is_empty() {
        let data = read_store_file(Path::new("src/tests/test_data/does_not_exist.json"))
            .expect("Missing file should be empty store");
        assert_eq!(data, StoreData::default());
    }

    #[test]
    fn test_read_malformed_store_names_path() {
        let dir = std::env::temp_dir().join(format!("dc-servers-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, r#"{"servers": [{"id": "one"}]}"#).unwrap();
        let err = read_store_file(&path).unwrap_err().to_string();
        assert!(err.contains("servers[0].id"), "unexpected error: {err}");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = std::env::temp_dir().join(format!("dc-servers-save-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");
        let settings = Settings::default();

        let mut store = ServerStore::open_path(&path, &settings).unwrap();
        store.upsert_customer(Customer {
            id: 7,
            customer_number: "C-7".into(),
            customer_name: "Acme".into(),
        });
        store.add_wan_subnet("8.8.8.0/29").unwrap();
        store.save().unwrap();

        let reopened = ServerStore::open_path(&path, &settings).unwrap();
        assert_eq!(reopened.data(), store.data());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_in_memory_store_cannot_save() {
        assert!(ServerStore::in_memory(StoreData::default()).save().is_err());
    }

    #[test]
    fn test_allocator_sees_only_active_servers() {
        let data = read_store_file(Path::new("src/tests/test_data/store_test_01.json")).unwrap();
        let store = ServerStore::in_memory(data);
        let alloc = store.allocator();
        assert!(alloc.in_use(AddressKind::Internal).contains("172.16.1.1"));
        assert!(!alloc.in_use(AddressKind::Internal).contains("172.16.9.1"));
    }
}
