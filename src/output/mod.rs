//! Output formatting for server listings.
//!
//! This module handles formatting and outputting server data:
//! - [`csv`] - CSV export
//! - [`terminal`] - Terminal table with colors

mod csv;
mod terminal;

pub use csv::{escape_csv_field, export_csv, EXPORT_HEADERS};
pub use terminal::{format_field, print_pools, print_servers};
