mod guardian;
mod health;
mod tables;

pub use guardian::{SchemaGuardian, SchemaReport, REPAIR_SUBJECT};
pub use health::{check_health, HealthCheck, HealthEnvironment, HealthStatus};
pub use tables::{
    APP_SETTINGS_TABLE, AUDIT_LOG_TABLE, CANONICAL_TABLES, MOVIES_TABLE, USER_PREFERENCES_TABLE,
    WISHLIST_TABLE,
};
