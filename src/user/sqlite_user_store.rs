use super::permissions::UserRole;
use super::user_models::UserPreference;
use super::user_store::UserStore;
use crate::schema::USER_PREFERENCES_TABLE;
use crate::sqlite_persistence::Database;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

const PREFERENCE_COLUMNS: &str = "user_id, username, email, theme, role";

#[derive(Clone)]
pub struct SqliteUserStore {
    database: Database,
}

impl SqliteUserStore {
    pub fn new(database: Database) -> Self {
        SqliteUserStore { database }
    }

    fn connect(&self) -> Result<Connection> {
        self.database.connect().context("Failed to open user database")
    }
}

impl UserStore for SqliteUserStore {
    fn get_preference(&self, user_id: &str) -> Result<Option<UserPreference>> {
        let conn = self.connect()?;
        let preference = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE user_id = ?1",
                    PREFERENCE_COLUMNS, USER_PREFERENCES_TABLE.name
                ),
                params![user_id],
                UserPreference::from_row,
            )
            .optional()?;
        Ok(preference)
    }

    fn insert_preference(&self, preference: &UserPreference) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                USER_PREFERENCES_TABLE.name, PREFERENCE_COLUMNS
            ),
            params![
                preference.user_id,
                preference.username,
                preference.email,
                preference.theme,
                preference.role.as_str()
            ],
        )
        .with_context(|| format!("Failed to create preference for {}", preference.user_id))?;
        Ok(())
    }

    fn update_identity(&self, user_id: &str, username: &str, email: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE user_preferences SET username = ?1, email = ?2 WHERE user_id = ?3",
            params![username, email, user_id],
        )?;
        Ok(())
    }

    fn set_role(&self, user_id: &str, role: UserRole) -> Result<bool> {
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE user_preferences SET role = ?1 WHERE user_id = ?2",
            params![role.as_str(), user_id],
        )?;
        Ok(updated > 0)
    }

    fn set_theme(&self, user_id: &str, theme: &str) -> Result<bool> {
        let conn = self.connect()?;
        let updated = conn.execute(
            "UPDATE user_preferences SET theme = ?1 WHERE user_id = ?2",
            params![theme, user_id],
        )?;
        Ok(updated > 0)
    }

    fn delete_preference(&self, user_id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn.execute(
            "DELETE FROM user_preferences WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(deleted > 0)
    }

    fn count_users(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM user_preferences", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_admins(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_preferences WHERE role = ?1",
            params![UserRole::Admin.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn list_preferences(&self) -> Result<Vec<UserPreference>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM user_preferences ORDER BY role ASC, username ASC",
            PREFERENCE_COLUMNS
        ))?;
        let preferences = stmt
            .query_map([], UserPreference::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(preferences)
    }
}
