use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Actor name used for entries written by the application itself.
pub const SYSTEM_ACTOR: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Added,
    Updated,
    Deleted,
    AddedFromWishlist,
    Repair,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Added => "ADDED",
            AuditAction::Updated => "UPDATED",
            AuditAction::Deleted => "DELETED",
            AuditAction::AddedFromWishlist => "ADDED_FROM_WISHLIST",
            AuditAction::Repair => "REPAIR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADDED" => Some(AuditAction::Added),
            "UPDATED" => Some(AuditAction::Updated),
            "DELETED" => Some(AuditAction::Deleted),
            "ADDED_FROM_WISHLIST" => Some(AuditAction::AddedFromWishlist),
            "REPAIR" => Some(AuditAction::Repair),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the audit log.
///
/// `action` stays a plain string: the log is append-only and may hold values
/// written by older versions of the application.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    /// Unix timestamp, assigned by the database.
    pub timestamp: i64,
    pub actor: String,
    pub action: String,
    pub subject: String,
    pub details: String,
}

impl AuditEntry {
    /// Expects the columns `id, timestamp, user_name, action, movie_title, details`.
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AuditEntry {
            id: row.get(0)?,
            timestamp: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
            actor: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            action: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            subject: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            details: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        })
    }

    pub fn typed_action(&self) -> Option<AuditAction> {
        AuditAction::parse(&self.action)
    }
}
