//! Domain models for the data-center server registry.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`Ipv4`] - IPv4 subnet with CIDR notation support
//! - [`InternalIpPoolEntry`] and [`WanPoolEntry`] - address pool rows
//! - [`ServerRecord`] and [`ServerInput`] - server rows and their editable fields
//! - [`Customer`] - customer rows supplied by the customer registry
//! - [`LookupEntry`] and [`LookupKind`] - host and farm lookup tables

mod customer;
mod ipv4;
mod lookup;
mod pool;
mod server;

// Re-export public types
pub use customer::Customer;
pub use ipv4::{mask_bits, Ipv4, MAX_LENGTH};
pub use lookup::{LookupEntry, LookupKind};
pub use pool::{AddressKind, InternalIpPoolEntry, WanPoolEntry};
pub use server::{ServerInput, ServerRecord};
