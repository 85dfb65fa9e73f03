use axum::extract::FromRef;

use crate::audit::{AuditAction, AuditStore};
use crate::branding::BrandingStore;
use crate::catalog::CatalogStore;
use crate::metadata::MetadataService;
use crate::oidc::{AuthStateStore, OidcClient};
use crate::schema::{HealthEnvironment, SchemaGuardian};
use crate::settings::SettingsStore;
use crate::sqlite_persistence::Database;
use crate::user::UserManager;
use crate::wishlist::WishlistStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use super::session::SessionStore;
use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedWishlistStore = Arc<dyn WishlistStore>;
pub type GuardedAuditStore = Arc<dyn AuditStore>;
pub type GuardedSettingsStore = Arc<dyn SettingsStore>;
pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedSessionStore = Arc<SessionStore>;
pub type GuardedSchemaGuardian = Arc<SchemaGuardian>;
pub type GuardedMetadataService = Arc<MetadataService>;
pub type GuardedBrandingStore = Arc<BrandingStore>;
pub type OptionalOidcClient = Option<Arc<OidcClient>>;
pub type GuardedAuthStateStore = Arc<AuthStateStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub database: Database,
    pub health_environment: HealthEnvironment,
    pub catalog_store: GuardedCatalogStore,
    pub wishlist_store: GuardedWishlistStore,
    pub audit_store: GuardedAuditStore,
    pub settings_store: GuardedSettingsStore,
    pub user_manager: GuardedUserManager,
    pub session_store: GuardedSessionStore,
    pub schema_guardian: GuardedSchemaGuardian,
    pub metadata_service: GuardedMetadataService,
    pub branding_store: GuardedBrandingStore,
    pub oidc_client: OptionalOidcClient,
    pub auth_state_store: GuardedAuthStateStore,
}

impl ServerState {
    /// Writes an audit entry. Failures are logged and otherwise ignored, the
    /// change being audited has already happened.
    pub fn record_audit(&self, actor: &str, action: AuditAction, subject: &str, details: &str) {
        if let Err(err) = self.audit_store.record(actor, action, subject, details) {
            warn!(
                "Failed to record {} audit entry for {:?}: {}",
                action.as_str(),
                subject,
                err
            );
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedWishlistStore {
    fn from_ref(input: &ServerState) -> Self {
        input.wishlist_store.clone()
    }
}

impl FromRef<ServerState> for GuardedAuditStore {
    fn from_ref(input: &ServerState) -> Self {
        input.audit_store.clone()
    }
}

impl FromRef<ServerState> for GuardedSettingsStore {
    fn from_ref(input: &ServerState) -> Self {
        input.settings_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedSessionStore {
    fn from_ref(input: &ServerState) -> Self {
        input.session_store.clone()
    }
}

impl FromRef<ServerState> for GuardedSchemaGuardian {
    fn from_ref(input: &ServerState) -> Self {
        input.schema_guardian.clone()
    }
}

impl FromRef<ServerState> for GuardedMetadataService {
    fn from_ref(input: &ServerState) -> Self {
        input.metadata_service.clone()
    }
}

impl FromRef<ServerState> for GuardedBrandingStore {
    fn from_ref(input: &ServerState) -> Self {
        input.branding_store.clone()
    }
}

impl FromRef<ServerState> for OptionalOidcClient {
    fn from_ref(input: &ServerState) -> Self {
        input.oidc_client.clone()
    }
}

impl FromRef<ServerState> for GuardedAuthStateStore {
    fn from_ref(input: &ServerState) -> Self {
        input.auth_state_store.clone()
    }
}
