//! Address pool rows consumed by the allocator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which address column of a server an operation concerns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Internal,
    Wan,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddressKind::Internal => write!(f, "internal"),
            AddressKind::Wan => write!(f, "wan"),
        }
    }
}

impl FromStr for AddressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(AddressKind::Internal),
            "wan" => Ok(AddressKind::Wan),
            other => Err(format!("unknown address kind: {other}")),
        }
    }
}

/// A single LAN address, optionally reserved for one host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InternalIpPoolEntry {
    pub address: String,
    #[serde(default)]
    pub host: Option<String>,
}

impl InternalIpPoolEntry {
    pub fn new(address: &str, host: Option<&str>) -> Self {
        InternalIpPoolEntry {
            address: address.trim().to_string(),
            host: host
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
        }
    }

    /// The bound host, treating a blank binding as none.
    pub fn bound_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

/// A WAN subnet in `a.b.c.d/mask` form.
///
/// Kept as text: rows that fail to parse simply contribute no addresses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WanPoolEntry {
    pub subnet: String,
}

impl WanPoolEntry {
    pub fn new(subnet: &str) -> Self {
        WanPoolEntry {
            subnet: subnet.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_kind_parse() {
        assert_eq!("internal".parse::<AddressKind>(), Ok(AddressKind::Internal));
        assert_eq!(" WAN ".parse::<AddressKind>(), Ok(AddressKind::Wan));
        assert!("lan".parse::<AddressKind>().is_err());
    }

    #[test]
    fn test_blank_host_is_unbound() {
        let entry = InternalIpPoolEntry::new(" 172.16.0.10 ", Some("  "));
        assert_eq!(entry.address, "172.16.0.10");
        assert_eq!(entry.host, None);
        assert_eq!(entry.bound_host(), None);

        let raw = InternalIpPoolEntry {
            address: "172.16.0.11".to_string(),
            host: Some(" ".to_string()),
        };
        assert_eq!(raw.bound_host(), None);
    }
}
