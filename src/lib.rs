//! Data-center server registry with internal/WAN address allocation.
//!
//! Servers are registered per customer with an internal and a WAN address.
//! The [`allocator`] decides which addresses are valid for a host and which
//! one to suggest next; [`store`] keeps servers, lookups and pools in a JSON
//! document; [`validation`] ties the two together before anything is saved.

pub mod allocator;
pub mod cli;
pub mod config;
pub mod models;
pub mod output;
pub mod store;
pub mod validation;

pub use allocator::{expand_subnet, AddressAllocator};
pub use config::Settings;
pub use models::AddressKind;
pub use store::{ServerStore, StoreData, StoreError};
pub use validation::{validate_server, ValidationError, ValidationErrors};
