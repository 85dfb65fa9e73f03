//! Application-wide key/value settings.
//!
//! Unlike user preferences these apply to every user. Values are stored as
//! plain strings; the only key the server itself interprets is `edit_mode`.

use crate::sqlite_persistence::Database;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

pub const EDIT_MODE_KEY: &str = "edit_mode";
pub const TMDB_API_KEY_SETTING: &str = "tmdb_api_key";

const ENABLED: &str = "1";
const DISABLED: &str = "0";

pub trait SettingsStore: Send + Sync {
    fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Inserts or replaces the value.
    fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    fn all_settings(&self) -> Result<BTreeMap<String, String>>;

    /// Edit mode is off unless explicitly set to `"1"`.
    fn is_edit_mode_enabled(&self) -> Result<bool> {
        Ok(self.get_setting(EDIT_MODE_KEY)?.as_deref() == Some(ENABLED))
    }

    fn set_edit_mode(&self, enabled: bool) -> Result<()> {
        self.set_setting(EDIT_MODE_KEY, if enabled { ENABLED } else { DISABLED })
    }
}

#[derive(Clone)]
pub struct SqliteSettingsStore {
    database: Database,
}

impl SqliteSettingsStore {
    pub fn new(database: Database) -> Self {
        SqliteSettingsStore { database }
    }

    fn connect(&self) -> Result<Connection> {
        self.database
            .connect()
            .context("Failed to open settings database")
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        let value = conn
            .query_row(
                "SELECT setting_value FROM app_settings WHERE setting_key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO app_settings (setting_key, setting_value) VALUES (?1, ?2)",
            params![key, value],
        )
        .with_context(|| format!("Failed to store setting {}", key))?;
        Ok(())
    }

    fn all_settings(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT setting_key, setting_value FROM app_settings")?;
        let settings = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                ))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(settings)
    }
}
