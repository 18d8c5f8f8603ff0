//! Host and farm lookup tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which lookup table an entry belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    Host,
    Farm,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LookupKind::Host => write!(f, "host"),
            LookupKind::Farm => write!(f, "farm"),
        }
    }
}

impl FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" | "location" => Ok(LookupKind::Host),
            "farm" => Ok(LookupKind::Farm),
            other => Err(format!("unknown lookup type: {other}")),
        }
    }
}

/// A named lookup row (host or farm).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LookupEntry {
    pub id: u64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}
