//! Server CRUD, soft delete and the trash.

use super::{ServerStore, StoreError};
use crate::models::{AddressKind, ServerInput, ServerRecord};
use chrono::{DateTime, Duration, Utc};

impl ServerStore {
    pub fn servers(&self) -> &[ServerRecord] {
        &self.data.servers
    }

    pub fn server(&self, id: u64) -> Option<&ServerRecord> {
        self.data.servers.iter().find(|s| s.id == id)
    }

    fn next_server_id(&self) -> u64 {
        self.data.servers.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    /// Validate and insert a new server, or update `id` when given.
    pub fn add_or_update(&mut self, input: &ServerInput, id: Option<u64>) -> Result<u64, StoreError> {
        if let Some(id) = id {
            if self.server(id).is_none() {
                return Err(StoreError::ServerNotFound(id));
            }
        }
        let input = input.trimmed();
        if let Err(errors) = self.validate(&input, id) {
            log::warn!("Rejected server '{}': {}", input.server_name, errors);
            return Err(errors.into());
        }

        let now = Utc::now();
        match id {
            Some(id) => {
                if let Some(record) = self.data.servers.iter_mut().find(|s| s.id == id) {
                    record.apply(&input, now);
                }
                log::info!("Updated server {id} '{}'", input.server_name);
                Ok(id)
            }
            None => {
                let id = self.next_server_id();
                self.data.servers.push(ServerRecord {
                    id,
                    customer_id: input.customer_id,
                    server_name: input.server_name.clone(),
                    ip_internal: input.ip_internal.clone(),
                    ip_wan: input.ip_wan.clone(),
                    host: input.host.clone(),
                    farm: input.farm.clone(),
                    is_deleted: false,
                    deleted_at: None,
                    created_at: now,
                    updated_at: now,
                });
                log::info!(
                    "Added server {id} '{}' internal={} wan={}",
                    input.server_name,
                    input.ip_internal,
                    input.ip_wan
                );
                Ok(id)
            }
        }
    }

    /// Move one server to the trash. Returns whether anything changed.
    pub fn soft_delete(&mut self, id: u64) -> bool {
        self.soft_delete_bulk(&[id]) == 1
    }

    /// Move servers to the trash; zero and unknown ids are ignored.
    pub fn soft_delete_bulk(&mut self, ids: &[u64]) -> usize {
        let now = Utc::now();
        let mut changed = 0;
        for record in self
            .data
            .servers
            .iter_mut()
            .filter(|s| s.id != 0 && ids.contains(&s.id) && s.is_active())
        {
            record.is_deleted = true;
            record.deleted_at = Some(now);
            changed += 1;
        }
        log::info!("Moved {changed} of {} requested servers to trash", ids.len());
        changed
    }

    /// Bring a server back from the trash.
    ///
    /// Its addresses are validated again since another server may have taken
    /// them in the meantime.
    pub fn restore(&mut self, id: u64) -> Result<(), StoreError> {
        let record = self.server(id).ok_or(StoreError::ServerNotFound(id))?;
        if record.is_active() {
            return Ok(());
        }
        self.validate(&record.to_input(), Some(id))?;

        if let Some(record) = self.data.servers.iter_mut().find(|s| s.id == id) {
            record.is_deleted = false;
            record.deleted_at = None;
            record.updated_at = Utc::now();
        }
        log::info!("Restored server {id} from trash");
        Ok(())
    }

    /// Remove a server for good, whether or not it is in the trash.
    pub fn delete_permanent(&mut self, id: u64) -> bool {
        let before = self.data.servers.len();
        self.data.servers.retain(|s| s.id != id);
        let removed = before != self.data.servers.len();
        if removed {
            log::info!("Deleted server {id} permanently");
        }
        removed
    }

    /// Empty the trash.
    pub fn purge_trash(&mut self) -> usize {
        let before = self.data.servers.len();
        self.data.servers.retain(|s| s.is_active());
        let removed = before - self.data.servers.len();
        log::info!("Purged {removed} servers from trash");
        removed
    }

    /// Delete trashed servers whose `deleted_at` is more than `retention_days` before `now`.
    ///
    /// A cutoff that falls outside the representable time range expires nothing.
    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention_days: u32) -> usize {
        let cutoff = match Duration::try_days(i64::from(retention_days))
            .and_then(|retention| now.checked_sub_signed(retention))
        {
            Some(cutoff) => cutoff,
            None => {
                log::warn!("Trash retention of {retention_days} days reaches before {now}; nothing purged");
                return 0;
            }
        };
        let before = self.data.servers.len();
        self.data.servers.retain(|s| match (s.is_deleted, s.deleted_at) {
            (true, Some(deleted_at)) => deleted_at >= cutoff,
            _ => true,
        });
        let removed = before - self.data.servers.len();
        log::info!("Purged {removed} servers deleted before {cutoff}");
        removed
    }

    /// Copy a server under "`<name> (Copy)`" with freshly allocated addresses.
    pub fn duplicate(&mut self, id: u64) -> Result<u64, StoreError> {
        let input = {
            let source = self.server(id).ok_or(StoreError::ServerNotFound(id))?;
            let allocator = self.allocator();
            let ip_internal = allocator
                .next_free_address(AddressKind::Internal, source.host.as_deref())
                .ok_or(StoreError::NoFreeAddress(AddressKind::Internal))?;
            let ip_wan = allocator
                .next_free_address(AddressKind::Wan, None)
                .ok_or(StoreError::NoFreeAddress(AddressKind::Wan))?;
            ServerInput {
                server_name: format!("{} (Copy)", source.server_name),
                ip_internal,
                ip_wan,
                ..source.to_input()
            }
        };
        self.add_or_update(&input, None)
    }
}
