use super::models::{AuditAction, AuditEntry};
use crate::schema::AUDIT_LOG_TABLE;
use crate::sqlite_persistence::{like_pattern, Database};
use anyhow::Result;
use rusqlite::{params, Connection};
use thiserror::Error;

pub const MAX_AUDIT_LISTING: usize = 100;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub trait AuditStore: Send + Sync {
    /// Appends one entry and returns its id.
    fn record(
        &self,
        actor: &str,
        action: AuditAction,
        subject: &str,
        details: &str,
    ) -> Result<i64, AuditError>;

    /// Newest entries first. `search` is matched as a substring against the
    /// subject, the actor and the action.
    fn list(&self, search: Option<&str>, limit: usize) -> Result<Vec<AuditEntry>>;
}

/// Appends an audit entry on an already open connection.
pub fn append_entry(
    conn: &Connection,
    actor: &str,
    action: AuditAction,
    subject: &str,
    details: &str,
) -> Result<i64, AuditError> {
    conn.execute(
        &format!(
            "INSERT INTO {} (user_name, action, movie_title, details) VALUES (?1, ?2, ?3, ?4)",
            AUDIT_LOG_TABLE.name
        ),
        params![actor, action.as_str(), subject, details],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Clone)]
pub struct SqliteAuditStore {
    database: Database,
}

impl SqliteAuditStore {
    pub fn new(database: Database) -> Self {
        SqliteAuditStore { database }
    }
}

impl AuditStore for SqliteAuditStore {
    fn record(
        &self,
        actor: &str,
        action: AuditAction,
        subject: &str,
        details: &str,
    ) -> Result<i64, AuditError> {
        let conn = self.database.connect()?;
        append_entry(&conn, actor, action, subject, details)
    }

    fn list(&self, search: Option<&str>, limit: usize) -> Result<Vec<AuditEntry>> {
        let conn = self.database.connect()?;
        let limit = limit.min(MAX_AUDIT_LISTING) as i64;
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let entries = match search {
            Some(term) => {
                let pattern = like_pattern(term);
                let mut stmt = conn.prepare(
                    "SELECT id, timestamp, user_name, action, movie_title, details FROM audit_log \
                     WHERE movie_title LIKE ?1 ESCAPE '\\' OR user_name LIKE ?1 ESCAPE '\\' \
                     OR action LIKE ?1 ESCAPE '\\' \
                     ORDER BY timestamp DESC, id DESC LIMIT ?2",
                )?;
                let entries = stmt
                    .query_map(params![pattern, limit], AuditEntry::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                entries
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, timestamp, user_name, action, movie_title, details FROM audit_log \
                     ORDER BY timestamp DESC, id DESC LIMIT ?1",
                )?;
                let entries = stmt
                    .query_map(params![limit], AuditEntry::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                entries
            }
        };
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteAuditStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let database = Database::new(temp_dir.path(), "test");
        database.create_if_missing().unwrap();
        AUDIT_LOG_TABLE
            .create_if_not_exists(&database.connect().unwrap())
            .unwrap();
        (SqliteAuditStore::new(database), temp_dir)
    }

    #[test]
    fn records_and_lists_newest_first() {
        let (store, _temp_dir) = create_tmp_store();

        let first = store
            .record("alice", AuditAction::Added, "Heat", "Method: Manual Entry")
            .unwrap();
        let second = store
            .record("bob", AuditAction::Deleted, "Ronin", "Permanent Delete")
            .unwrap();
        assert!(second > first);

        let entries = store.list(None, 100).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject, "Ronin");
        assert_eq!(entries[0].actor, "bob");
        assert_eq!(entries[0].typed_action(), Some(AuditAction::Deleted));
        assert_eq!(entries[1].details, "Method: Manual Entry");
        assert!(entries[1].timestamp > 0);
    }

    #[test]
    fn search_matches_subject_actor_and_action() {
        let (store, _temp_dir) = create_tmp_store();
        store
            .record("alice", AuditAction::Added, "Heat", "")
            .unwrap();
        store
            .record("bob", AuditAction::Updated, "Ronin", "")
            .unwrap();
        store
            .record("System", AuditAction::Repair, "Database Structure", "")
            .unwrap();

        let by_subject = store.list(Some("heat"), 100).unwrap();
        assert_eq!(by_subject.len(), 1);
        assert_eq!(by_subject[0].subject, "Heat");

        let by_actor = store.list(Some("bob"), 100).unwrap();
        assert_eq!(by_actor.len(), 1);
        assert_eq!(by_actor[0].subject, "Ronin");

        let by_action = store.list(Some("REPAIR"), 100).unwrap();
        assert_eq!(by_action.len(), 1);
        assert_eq!(by_action[0].actor, "System");

        // Blank search lists everything.
        assert_eq!(store.list(Some("  "), 100).unwrap().len(), 3);
    }

    #[test]
    fn search_wildcards_match_literally() {
        let (store, _temp_dir) = create_tmp_store();
        store
            .record("alice", AuditAction::Added, "100% Wolf", "")
            .unwrap();
        store
            .record("alice", AuditAction::Added, "1000 Years", "")
            .unwrap();

        let hits = store.list(Some("100%"), 100).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subject, "100% Wolf");

        assert!(store.list(Some("_"), 100).unwrap().is_empty());
    }

    #[test]
    fn listing_is_capped() {
        let (store, _temp_dir) = create_tmp_store();
        for i in 0..(MAX_AUDIT_LISTING + 5) {
            store
                .record("alice", AuditAction::Added, &format!("Movie {}", i), "")
                .unwrap();
        }
        assert_eq!(store.list(None, 1000).unwrap().len(), MAX_AUDIT_LISTING);
        assert_eq!(store.list(None, 3).unwrap().len(), 3);
    }

    #[test]
    fn record_fails_without_table() {
        let temp_dir = TempDir::new().unwrap();
        let database = Database::new(temp_dir.path(), "test");
        database.create_if_missing().unwrap();
        let store = SqliteAuditStore::new(database);

        let result = store.record("alice", AuditAction::Added, "Heat", "");
        assert!(matches!(result, Err(AuditError::Database(_))));
    }
}
