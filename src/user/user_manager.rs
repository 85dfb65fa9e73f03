use super::permissions::UserRole;
use super::user_models::{IdentityClaims, UserPreference, DEFAULT_THEME};
use super::user_store::UserStore;
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of an administrative action on another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAdminOutcome {
    Applied,
    /// Admins cannot act on their own account.
    RefusedSelf,
    NotFound,
}

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
    admin_group: Option<String>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>, admin_group: Option<String>) -> Self {
        Self {
            user_store,
            admin_group: admin_group.filter(|g| !g.trim().is_empty()),
        }
    }

    pub fn admin_group(&self) -> Option<&str> {
        self.admin_group.as_deref()
    }

    /// Role implied by the admin group claim, if an admin group is configured.
    fn role_from_groups(&self, claims: &IdentityClaims) -> Option<UserRole> {
        self.admin_group.as_deref().map(|group| {
            if claims.is_member_of(group) {
                UserRole::Admin
            } else {
                UserRole::Member
            }
        })
    }

    /// Creates or refreshes the stored preference of a user who just
    /// authenticated, and settles their role.
    ///
    /// - The very first user becomes admin no matter what the claims say.
    /// - With an admin group configured, group membership decides the role on
    ///   every login.
    /// - Without one, stored roles are kept, except that a login while no
    ///   admin exists promotes the user so the instance cannot lock itself out.
    ///
    /// Not transactional. Two concurrent logins may both self-promote, which
    /// converges to the same state.
    pub fn resolve_on_login(&self, claims: &IdentityClaims) -> Result<UserPreference> {
        if claims.subject.is_empty() {
            bail!("Identity claims carry no subject");
        }
        let username = claims.username();
        let email = claims.email();

        match self.user_store.get_preference(&claims.subject)? {
            None => {
                let role = if self.user_store.count_users()? == 0 {
                    info!("First login ever, {} becomes admin", username);
                    UserRole::Admin
                } else {
                    self.role_from_groups(claims).unwrap_or(UserRole::Member)
                };
                let preference = UserPreference {
                    user_id: claims.subject.clone(),
                    username: username.to_string(),
                    email: email.to_string(),
                    theme: DEFAULT_THEME.to_string(),
                    role,
                };
                self.user_store.insert_preference(&preference)?;
                info!(
                    "Created preference for {} ({}) with role {}",
                    username,
                    claims.subject,
                    role.as_str()
                );
                Ok(preference)
            }
            Some(mut preference) => {
                self.user_store
                    .update_identity(&claims.subject, username, email)?;
                preference.username = username.to_string();
                preference.email = email.to_string();

                let resolved_role = match self.role_from_groups(claims) {
                    Some(role) => role,
                    None if preference.role != UserRole::Admin
                        && self.user_store.count_admins()? == 0 =>
                    {
                        warn!("No admin left, promoting {} on login", username);
                        UserRole::Admin
                    }
                    None => preference.role,
                };

                if resolved_role != preference.role {
                    debug!(
                        "Role of {} changes from {} to {}",
                        username,
                        preference.role.as_str(),
                        resolved_role.as_str()
                    );
                    self.user_store.set_role(&claims.subject, resolved_role)?;
                    preference.role = resolved_role;
                }
                Ok(preference)
            }
        }
    }

    pub fn get_preference(&self, user_id: &str) -> Result<Option<UserPreference>> {
        self.user_store.get_preference(user_id)
    }

    pub fn list_users(&self) -> Result<Vec<UserPreference>> {
        self.user_store.list_preferences()
    }

    pub fn set_theme(&self, user_id: &str, theme: &str) -> Result<bool> {
        self.user_store.set_theme(user_id, theme.trim())
    }

    fn apply_to_other<F>(&self, actor_id: &str, target_id: &str, action: F) -> Result<UserAdminOutcome>
    where
        F: FnOnce(&dyn UserStore) -> Result<bool>,
    {
        if actor_id == target_id {
            return Ok(UserAdminOutcome::RefusedSelf);
        }
        if action(self.user_store.as_ref())? {
            Ok(UserAdminOutcome::Applied)
        } else {
            Ok(UserAdminOutcome::NotFound)
        }
    }

    pub fn promote(&self, actor_id: &str, target_id: &str) -> Result<UserAdminOutcome> {
        self.apply_to_other(actor_id, target_id, |store| {
            store.set_role(target_id, UserRole::Admin)
        })
    }

    pub fn demote(&self, actor_id: &str, target_id: &str) -> Result<UserAdminOutcome> {
        self.apply_to_other(actor_id, target_id, |store| {
            store.set_role(target_id, UserRole::Member)
        })
    }

    pub fn delete_user(&self, actor_id: &str, target_id: &str) -> Result<UserAdminOutcome> {
        self.apply_to_other(actor_id, target_id, |store| {
            store.delete_preference(target_id)
        })
    }
}
