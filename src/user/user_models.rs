use super::permissions::UserRole;
use rusqlite::Row;
use serde::Serialize;

pub const DEFAULT_THEME: &str = "default";
pub const UNKNOWN_USERNAME: &str = "Unknown";
pub const UNKNOWN_EMAIL: &str = "No Email";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPreference {
    /// Identity subject from the identity provider.
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub theme: String,
    pub role: UserRole,
}

impl UserPreference {
    /// Expects `user_id, username, email, theme, role`. Unknown roles read as
    /// member.
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let role: Option<String> = row.get(4)?;
        Ok(UserPreference {
            user_id: row.get(0)?,
            username: row
                .get::<_, Option<String>>(1)?
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string()),
            email: row
                .get::<_, Option<String>>(2)?
                .unwrap_or_else(|| UNKNOWN_EMAIL.to_string()),
            theme: row
                .get::<_, Option<String>>(3)?
                .unwrap_or_else(|| DEFAULT_THEME.to_string()),
            role: role
                .as_deref()
                .and_then(UserRole::from_str)
                .unwrap_or_default(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// What the identity provider told us about a user at login.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityClaims {
    pub subject: String,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub groups: Vec<String>,
}

impl IdentityClaims {
    pub fn username(&self) -> &str {
        self.preferred_username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(UNKNOWN_USERNAME)
    }

    pub fn email(&self) -> &str {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(UNKNOWN_EMAIL)
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
