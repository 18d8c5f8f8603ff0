//! Bulk insert from already-parsed rows.

use super::{ServerStore, StoreError};
use crate::models::ServerInput;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    static ref KEY_STRIP: Regex = Regex::new(r"[^a-z0-9_\-]").expect("Invalid Regex?");
}

/// Normalise a column header: lower-case, keeping only `[a-z0-9_-]`.
pub fn sanitize_key(header: &str) -> String {
    KEY_STRIP
        .replace_all(&header.to_lowercase(), "")
        .into_owned()
}

/// One row of an import file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImportRow {
    pub customer_number: String,
    pub customer_name: String,
    pub server_name: String,
    pub ip_internal: String,
    pub ip_wan: String,
    #[serde(alias = "location")]
    pub host: String,
    pub farm: String,
}

impl ImportRow {
    /// Map a header row and a value row onto the known columns.
    ///
    /// Unknown columns are ignored and missing ones are empty.
    pub fn from_columns<H, V>(headers: &[H], values: &[V]) -> ImportRow
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let mapped: HashMap<String, &str> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = values.get(i).map(|v| v.as_ref()).unwrap_or("");
                (sanitize_key(h.as_ref()), value)
            })
            .collect();
        let get = |key: &str| mapped.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let host = match get("host") {
            host if host.is_empty() => get("location"),
            host => host,
        };
        ImportRow {
            customer_number: get("customer_number"),
            customer_name: get("customer_name"),
            server_name: get("server_name"),
            ip_internal: get("ip_internal"),
            ip_wan: get("ip_wan"),
            host,
            farm: get("farm"),
        }
    }

    fn customer_label(&self) -> &str {
        if self.customer_number.trim().is_empty() {
            self.customer_name.trim()
        } else {
            self.customer_number.trim()
        }
    }
}

/// Contents of an import file: keyed rows, or a header row with value rows.
///
/// ```json
/// {"headers": ["Customer_Number", "Server_Name"], "rows": [["1001", "web-01"]]}
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ImportDocument {
    Rows(Vec<ImportRow>),
    Columns {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

impl ImportDocument {
    /// Flatten into rows, mapping column documents through [`ImportRow::from_columns`].
    pub fn into_rows(self) -> Vec<ImportRow> {
        match self {
            ImportDocument::Rows(rows) => rows,
            ImportDocument::Columns { headers, rows } => rows
                .iter()
                .map(|values| ImportRow::from_columns(&headers, values))
                .collect(),
        }
    }
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub inserted: usize,
    pub errors: Vec<String>,
}

impl ServerStore {
    /// Resolve a customer by exact number, else by case-insensitive name.
    pub fn find_customer_id(&self, customer_number: &str, customer_name: &str) -> Option<u64> {
        let number = customer_number.trim();
        let name = customer_name.trim().to_lowercase();

        let by_number = || {
            self.customers()
                .iter()
                .find(|c| !number.is_empty() && c.customer_number == number)
        };
        let by_name = || {
            self.customers()
                .iter()
                .find(|c| !name.is_empty() && c.customer_name.to_lowercase() == name)
        };
        by_number().or_else(by_name).map(|c| c.id)
    }

    /// Insert every row that resolves to a customer and validates.
    ///
    /// Rows are independent: a bad row is reported and the import continues.
    pub fn import_rows(&mut self, rows: &[ImportRow]) -> ImportReport {
        let mut report = ImportReport::default();

        for (index, row) in rows.iter().enumerate() {
            let line = index + 1;
            let customer_id = match self.find_customer_id(&row.customer_number, &row.customer_name) {
                Some(id) => id,
                None => {
                    report
                        .errors
                        .push(format!("row {line}: customer not found ({})", row.customer_label()));
                    continue;
                }
            };

            let input = ServerInput {
                customer_id,
                server_name: row.server_name.clone(),
                ip_internal: row.ip_internal.clone(),
                ip_wan: row.ip_wan.clone(),
                host: Some(row.host.clone()),
                farm: Some(row.farm.clone()),
            };
            match self.add_or_update(&input, None) {
                Ok(_) => report.inserted += 1,
                Err(StoreError::Invalid(errors)) => report
                    .errors
                    .extend(errors.iter().map(|e| format!("row {line}: {e}"))),
                Err(e) => report.errors.push(format!("row {line}: {e}")),
            }
        }

        log::info!(
            "Imported {} of {} rows, {} errors",
            report.inserted,
            rows.len(),
            report.errors.len()
        );
        report
    }
}
