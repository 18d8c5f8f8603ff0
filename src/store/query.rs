//! Searching and ordering server listings.

use super::ServerStore;
use crate::models::ServerRecord;
use std::cmp::Ordering;

/// Column a listing is ordered by. Unknown names fall back to the server name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    Id,
    #[default]
    ServerName,
    IpInternal,
    IpWan,
    Host,
    Farm,
    CreatedAt,
}

impl From<&str> for OrderBy {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => OrderBy::Id,
            "ip_internal" => OrderBy::IpInternal,
            "ip_wan" => OrderBy::IpWan,
            "host" | "location" => OrderBy::Host,
            "farm" => OrderBy::Farm,
            "created_at" => OrderBy::CreatedAt,
            _ => OrderBy::ServerName,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<&str> for SortOrder {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ServerQuery {
    pub include_deleted: bool,
    /// Case-insensitive substring over name, addresses and customer.
    pub search: String,
    pub order_by: OrderBy,
    pub order: SortOrder,
}

/// A server joined with its customer.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRow {
    pub server: ServerRecord,
    pub customer_number: String,
    pub customer_name: String,
}

impl ServerRow {
    fn matches(&self, needle: &str) -> bool {
        [
            self.server.server_name.as_str(),
            self.server.ip_internal.as_str(),
            self.server.ip_wan.as_str(),
            self.customer_name.as_str(),
            self.customer_number.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare(a: &ServerRecord, b: &ServerRecord, order_by: OrderBy) -> Ordering {
    match order_by {
        OrderBy::Id => a.id.cmp(&b.id),
        OrderBy::ServerName => text_cmp(&a.server_name, &b.server_name),
        OrderBy::IpInternal => text_cmp(&a.ip_internal, &b.ip_internal),
        OrderBy::IpWan => text_cmp(&a.ip_wan, &b.ip_wan),
        OrderBy::Host => text_cmp(
            a.host.as_deref().unwrap_or(""),
            b.host.as_deref().unwrap_or(""),
        ),
        OrderBy::Farm => text_cmp(
            a.farm.as_deref().unwrap_or(""),
            b.farm.as_deref().unwrap_or(""),
        ),
        OrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

impl ServerStore {
    /// List servers joined with their customers.
    pub fn list(&self, query: &ServerQuery) -> Vec<ServerRow> {
        let needle = query.search.trim().to_lowercase();
        let mut rows: Vec<ServerRow> = self
            .data
            .servers
            .iter()
            .filter(|s| query.include_deleted || s.is_active())
            .map(|s| {
                let customer = self.customer(s.customer_id);
                ServerRow {
                    server: s.clone(),
                    customer_number: customer.map(|c| c.customer_number.clone()).unwrap_or_default(),
                    customer_name: customer.map(|c| c.customer_name.clone()).unwrap_or_default(),
                }
            })
            .filter(|row| needle.is_empty() || row.matches(&needle))
            .collect();

        rows.sort_by(|a, b| {
            let ordering = compare(&a.server, &b.server, query.order_by);
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        log::debug!("list({:?}) -> {} rows", query, rows.len());
        rows
    }
}
