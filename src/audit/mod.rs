mod diff;
mod models;
mod store;

pub use diff::compute_diff;
pub use models::{AuditAction, AuditEntry, SYSTEM_ACTOR};
pub use store::{append_entry, AuditError, AuditStore, SqliteAuditStore, MAX_AUDIT_LISTING};
