pub mod permissions;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use permissions::{Permission, UserRole};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{UserAdminOutcome, UserManager};
pub use user_models::{IdentityClaims, UserPreference, DEFAULT_THEME};
pub use user_store::UserStore;
