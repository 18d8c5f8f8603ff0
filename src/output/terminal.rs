//! Terminal output utilities.
//!
//! Provides formatting helpers and the table printers used by the CLI.

use crate::allocator::{AddressAllocator, HostKey};
use crate::store::ServerRow;
use chrono_tz::Tz;
use colored::Colorize;
use std::io::Write;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Print server rows as an aligned table; trashed rows are shown in red.
pub fn print_servers<W: Write>(rows: &[ServerRow], tz: Tz, out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        r#"  "id",       "server_name",  "ip_internal",       "ip_wan",       "host",       "farm",          "customer",          "updated""#
    )?;
    for row in rows {
        let s = &row.server;
        let line = format!(
            "{id},{name},{internal},{wan},{host},{farm},{customer},{updated}",
            id = format_field(s.id, 6),
            name = format_field(&s.server_name, 20),
            internal = format_field(&s.ip_internal, 15),
            wan = format_field(&s.ip_wan, 17),
            host = format_field(s.host.as_deref().unwrap_or("-"), 12),
            farm = format_field(s.farm.as_deref().unwrap_or("-"), 12),
            customer = format_field(format!("{} {}", row.customer_number, row.customer_name), 20),
            updated = format_field(
                s.updated_at.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                18
            ),
        );
        if s.is_deleted {
            writeln!(out, "{}", line.red())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    writeln!(out, "# {} servers", rows.len())
}

/// Print both pools with what is in use and what is offered next.
pub fn print_pools<W: Write>(allocator: &AddressAllocator, out: &mut W) -> std::io::Result<()> {
    let in_use = allocator.in_use(crate::models::AddressKind::Internal);
    let free = allocator.free_by_host();

    writeln!(out, "{}", "# internal pool".bold())?;
    for entry in allocator.internal_pool() {
        let key = HostKey::from_host(entry.bound_host());
        let state = if in_use.contains(entry.address.trim()) {
            "used".red()
        } else if free.get(&key) == Some(entry.address.trim()) {
            "next".green()
        } else {
            "free".normal()
        };
        writeln!(
            out,
            "{},{},{}",
            format_field(&entry.address, 17),
            format_field(entry.bound_host().unwrap_or("-"), 12),
            state
        )?;
    }

    writeln!(out, "{}", "# wan pool".bold())?;
    for entry in allocator.wan_pool() {
        writeln!(out, "{}", format_field(&entry.subnet, 20))?;
    }
    match allocator.next_free_address(crate::models::AddressKind::Wan, None) {
        Some(next) => writeln!(out, "# next wan: {}", next.green()),
        None => writeln!(out, "# next wan: {}", "none".red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 6), "\"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "\"long_value\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "  \"42\"");
    }
}
