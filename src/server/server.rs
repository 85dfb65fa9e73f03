use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

use super::admin_routes::admin_routes;
use super::auth_routes::auth_routes;
use super::catalog_routes::catalog_routes;
use super::http_layers::log_requests;
use super::metadata_routes::metadata_routes;
use super::session::{Session, SessionStore};
use super::settings_routes::settings_routes;
use super::state::{GuardedBrandingStore, OptionalOidcClient, ServerState};
use super::wishlist_routes::wishlist_routes;
use super::ServerConfig;

use crate::audit::SqliteAuditStore;
use crate::branding::{BrandingStore, LOGO_ROUTE};
use crate::catalog::SqliteCatalogStore;
use crate::config::AppConfig;
use crate::metadata::MetadataService;
use crate::oidc::AuthStateStore;
use crate::schema::{HealthEnvironment, SchemaGuardian};
use crate::settings::SqliteSettingsStore;
use crate::user::{SqliteUserStore, UserManager};
use crate::wishlist::SqliteWishlistStore;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub signed_in: bool,
    pub username: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        signed_in: session.is_some(),
        username: session.map(|s| s.username),
    };
    Json(stats)
}

/// GET /branding/logo - The uploaded logo, 404 while none exists
async fn get_logo(State(branding): State<GuardedBrandingStore>) -> Response {
    match branding.read_logo() {
        Ok(Some(bytes)) => {
            let mime_type = infer::get(&bytes)
                .map(|kind| kind.mime_type())
                .unwrap_or("application/octet-stream");
            ([(header::CONTENT_TYPE, mime_type)], bytes).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to read logo: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl ServerState {
    /// Wires the SQLite-backed stores for `app_config`. Does not touch the
    /// database; run the schema guardian first.
    pub fn new(config: ServerConfig, app_config: &AppConfig, oidc_client: OptionalOidcClient) -> ServerState {
        let database = app_config.database();
        let metadata_service = MetadataService::from_settings(&app_config.metadata);
        let health_environment = HealthEnvironment {
            tmdb_configured: app_config.metadata.tmdb_api_key.is_some(),
            omdb_configured: app_config.metadata.omdb_api_key.is_some(),
            oidc_configured: oidc_client.is_some(),
        };
        let admin_group = app_config.oidc.as_ref().and_then(|o| o.admin_group.clone());
        let user_store = Arc::new(SqliteUserStore::new(database.clone()));

        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("HYLLA_GIT_HASH").to_owned(),
            database: database.clone(),
            health_environment,
            catalog_store: Arc::new(SqliteCatalogStore::new(database.clone())),
            wishlist_store: Arc::new(SqliteWishlistStore::new(database.clone())),
            audit_store: Arc::new(SqliteAuditStore::new(database.clone())),
            settings_store: Arc::new(SqliteSettingsStore::new(database.clone())),
            user_manager: Arc::new(UserManager::new(user_store, admin_group)),
            session_store: Arc::new(SessionStore::new()),
            schema_guardian: Arc::new(SchemaGuardian::new(database, app_config.retry_policy())),
            metadata_service: Arc::new(metadata_service),
            branding_store: Arc::new(BrandingStore::new(&app_config.uploads_dir)),
            oidc_client,
            auth_state_store: Arc::new(AuthStateStore::new()),
        }
    }
}

pub fn make_app(state: ServerState) -> Router {
    let v1_routes: Router<ServerState> = Router::new()
        .merge(catalog_routes())
        .merge(wishlist_routes())
        .merge(metadata_routes())
        .merge(settings_routes())
        .nest("/admin", admin_routes());

    let api_router: Router = Router::new()
        .nest("/v1", v1_routes)
        .nest("/auth", auth_routes())
        .route(LOGO_ROUTE, get(get_logo))
        .with_state(state.clone());

    let home_router: Router = match state.config.frontend_dir_path.clone() {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .merge(api_router)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn spawn_session_cleanup(state: &ServerState) {
    let sessions = state.session_store.clone();
    let auth_states = state.auth_state_store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            debug!("Dropping expired sessions and pending logins");
            sessions.cleanup_expired().await;
            auth_states.cleanup_expired().await;
        }
    });
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    spawn_session_cleanup(&state);
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
