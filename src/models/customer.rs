//! Customer data model.

use serde::{Deserialize, Serialize};

/// A customer that servers are registered against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: u64,
    /// Business-facing customer number, matched exactly on import.
    pub customer_number: String,
    /// Display name, matched case-insensitively on import.
    pub customer_name: String,
}
