use super::permissions::UserRole;
use super::user_models::UserPreference;
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Returns Ok(None) if there is no preference for the subject.
    fn get_preference(&self, user_id: &str) -> Result<Option<UserPreference>>;

    fn insert_preference(&self, preference: &UserPreference) -> Result<()>;

    /// Refreshes the identity fields without touching theme or role.
    fn update_identity(&self, user_id: &str, username: &str, email: &str) -> Result<()>;

    /// Returns false if the user does not exist.
    fn set_role(&self, user_id: &str, role: UserRole) -> Result<bool>;

    /// Returns false if the user does not exist.
    fn set_theme(&self, user_id: &str, theme: &str) -> Result<bool>;

    /// Returns false if the user does not exist.
    fn delete_preference(&self, user_id: &str) -> Result<bool>;

    fn count_users(&self) -> Result<usize>;

    fn count_admins(&self) -> Result<usize>;

    /// All users, ordered by role then username.
    fn list_preferences(&self) -> Result<Vec<UserPreference>>;
}
