//! Server record data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The editable fields of a server, as submitted for create or update.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ServerInput {
    pub customer_id: u64,
    pub server_name: String,
    pub ip_internal: String,
    pub ip_wan: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub farm: Option<String>,
}

impl ServerInput {
    /// Copy with every text field trimmed and blank options dropped.
    pub fn trimmed(&self) -> ServerInput {
        ServerInput {
            customer_id: self.customer_id,
            server_name: self.server_name.trim().to_string(),
            ip_internal: self.ip_internal.trim().to_string(),
            ip_wan: self.ip_wan.trim().to_string(),
            host: trim_option(self.host.as_deref()),
            farm: trim_option(self.farm.as_deref()),
        }
    }
}

fn trim_option(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A stored server row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerRecord {
    pub id: u64,
    pub customer_id: u64,
    pub server_name: String,
    pub ip_internal: String,
    pub ip_wan: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub farm: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServerRecord {
    /// Active records are the ones not in the trash.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// The editable fields of this record.
    pub fn to_input(&self) -> ServerInput {
        ServerInput {
            customer_id: self.customer_id,
            server_name: self.server_name.clone(),
            ip_internal: self.ip_internal.clone(),
            ip_wan: self.ip_wan.clone(),
            host: self.host.clone(),
            farm: self.farm.clone(),
        }
    }

    /// Overwrite the editable fields and bump `updated_at`.
    pub fn apply(&mut self, input: &ServerInput, now: DateTime<Utc>) {
        self.customer_id = input.customer_id;
        self.server_name = input.server_name.clone();
        self.ip_internal = input.ip_internal.clone();
        self.ip_wan = input.ip_wan.clone();
        self.host = input.host.clone();
        self.farm = input.farm.clone();
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_drops_blank_options() {
        let input = ServerInput {
            customer_id: 3,
            server_name: "  web-01 ".to_string(),
            ip_internal: " 172.16.0.5".to_string(),
            ip_wan: "8.8.8.2 ".to_string(),
            host: Some("   ".to_string()),
            farm: Some(" farm-a ".to_string()),
        };
        let t = input.trimmed();
        assert_eq!(t.server_name, "web-01");
        assert_eq!(t.ip_internal, "172.16.0.5");
        assert_eq!(t.ip_wan, "8.8.8.2");
        assert_eq!(t.host, None);
        assert_eq!(t.farm.as_deref(), Some("farm-a"));
    }

    #[test]
    fn test_record_defaults_when_deserialized() {
        let json = r#"{
            "id": 1, "customer_id": 2, "server_name": "db",
            "ip_internal": "172.16.0.9", "ip_wan": "8.8.8.3",
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let record: ServerRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_active());
        assert_eq!(record.host, None);
        assert_eq!(record.deleted_at, None);
    }
}
