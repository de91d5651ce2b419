use serde::{Deserialize, Serialize};

/// A single point-affecting event, in the one shape the domain layer works
/// with regardless of which ledger table the row came from.
///
/// Entries are append-only: corrections are new entries with the opposite
/// sign, never edits or deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    /// The child id form the source row carried: canonical id for rows from
    /// the current table, legacy uid for rows from the old one.
    pub child_ref: String,
    /// Signed point amount (negative for spends and corrections).
    pub delta: i64,
    pub reason: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl LedgerEntry {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
