//! Administration: health, repair, users, statistics, audit log, branding.

use super::responses::{error_response, forbidden, internal_error, not_found};
use super::session::Session;
use super::state::{
    GuardedAuditStore, GuardedBrandingStore, GuardedCatalogStore, GuardedSchemaGuardian,
    GuardedUserManager, ServerState,
};
use crate::audit::MAX_AUDIT_LISTING;
use crate::branding::{BrandingError, MAX_LOGO_BYTES};
use crate::schema::{check_health, HealthCheck, HealthStatus};
use crate::user::{Permission, UserAdminOutcome};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const LOGO_FIELD_NAME: &str = "logo";
/// Room for the multipart framing around the largest accepted logo.
const LOGO_UPLOAD_BODY_LIMIT: usize = MAX_LOGO_BYTES + 64 * 1024;

#[derive(Serialize, Debug)]
struct HealthResponse {
    healthy: bool,
    checks: Vec<HealthCheck>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct AuditParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize, Debug)]
struct LogoResponse {
    logo_url: Option<String>,
    mime_type: &'static str,
}

// =============================================================================
// Database health
// =============================================================================

/// GET /admin/health
async fn get_health(session: Session, State(state): State<ServerState>) -> Response {
    if !session.has_permission(Permission::ServerAdmin) {
        return forbidden();
    }
    let checks = check_health(&state.database, &state.health_environment);
    // Missing API keys are worth a look, not a failed report.
    let healthy = checks
        .iter()
        .all(|c| matches!(c.status, HealthStatus::Ok | HealthStatus::Warning));
    Json(HealthResponse { healthy, checks }).into_response()
}

/// POST /admin/health/repair - Create whatever is missing
async fn post_repair(
    session: Session,
    State(guardian): State<GuardedSchemaGuardian>,
) -> Response {
    if !session.has_permission(Permission::ServerAdmin) {
        return forbidden();
    }
    info!("{} requested a schema repair", session.username);

    match tokio::task::spawn_blocking(move || guardian.ensure_schema()).await {
        Ok(report) => {
            if !report.is_healthy() {
                warn!("Schema repair incomplete: {:?}", report.failure);
            }
            Json(report).into_response()
        }
        Err(err) => internal_error("Schema repair task failed", err),
    }
}

// =============================================================================
// Users
// =============================================================================

/// GET /admin/users - Admins first, then by username
async fn list_users(session: Session, State(users): State<GuardedUserManager>) -> Response {
    if !session.has_permission(Permission::ManageUsers) {
        return forbidden();
    }
    match users.list_users() {
        Ok(users) => Json(users).into_response(),
        Err(err) => internal_error("Failed to list users", err),
    }
}

fn user_admin_response(outcome: anyhow::Result<UserAdminOutcome>, context: &str) -> Response {
    match outcome {
        Ok(UserAdminOutcome::Applied) => StatusCode::NO_CONTENT.into_response(),
        Ok(UserAdminOutcome::RefusedSelf) => error_response(
            StatusCode::BAD_REQUEST,
            "You cannot change your own account",
        ),
        Ok(UserAdminOutcome::NotFound) => not_found("User"),
        Err(err) => internal_error(context, err),
    }
}

/// POST /admin/users/{id}/promote
async fn promote_user(
    session: Session,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    if !session.has_permission(Permission::ManageUsers) {
        return forbidden();
    }
    let outcome = state.user_manager.promote(&session.user_id, &user_id);
    if let Ok(UserAdminOutcome::Applied) = outcome {
        info!("{} promoted user {}", session.username, user_id);
    }
    user_admin_response(outcome, "Failed to promote user")
}

/// POST /admin/users/{id}/demote
async fn demote_user(
    session: Session,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    if !session.has_permission(Permission::ManageUsers) {
        return forbidden();
    }
    let outcome = state.user_manager.demote(&session.user_id, &user_id);
    if let Ok(UserAdminOutcome::Applied) = outcome {
        info!("{} demoted user {}", session.username, user_id);
    }
    user_admin_response(outcome, "Failed to demote user")
}

/// DELETE /admin/users/{id} - Also ends the user's sessions
async fn delete_user(
    session: Session,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    if !session.has_permission(Permission::ManageUsers) {
        return forbidden();
    }
    let outcome = state.user_manager.delete_user(&session.user_id, &user_id);
    if let Ok(UserAdminOutcome::Applied) = outcome {
        let ended = state.session_store.remove_user(&user_id).await;
        info!(
            "{} deleted user {} ({} session(s) ended)",
            session.username, user_id, ended
        );
    }
    user_admin_response(outcome, "Failed to delete user")
}

// =============================================================================
// Collection overview
// =============================================================================

/// GET /admin/stats
async fn get_stats(session: Session, State(catalog): State<GuardedCatalogStore>) -> Response {
    if !session.has_permission(Permission::ServerAdmin) {
        return forbidden();
    }
    match catalog.collection_stats() {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => internal_error("Failed to compute statistics", err),
    }
}

/// GET /admin/audit?q=&limit= - Newest entries first
async fn get_audit_log(
    session: Session,
    State(audit): State<GuardedAuditStore>,
    Query(params): Query<AuditParams>,
) -> Response {
    if !session.has_permission(Permission::ViewAuditLog) {
        return forbidden();
    }
    let limit = params.limit.unwrap_or(MAX_AUDIT_LISTING);
    match audit.list(params.q.as_deref(), limit) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => internal_error("Failed to read audit log", err),
    }
}

// =============================================================================
// Branding
// =============================================================================

/// POST /admin/settings/logo - Multipart upload, field `logo`
async fn upload_logo(
    session: Session,
    State(branding): State<GuardedBrandingStore>,
    mut multipart: Multipart,
) -> Response {
    if !session.has_permission(Permission::ServerAdmin) {
        return forbidden();
    }

    let mut upload: Option<(String, Vec<u8>)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", err),
                )
            }
        };
        if field.name() != Some(LOGO_FIELD_NAME) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read upload: {}", err),
                )
            }
        }
    }

    let Some((file_name, data)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    match branding.save_logo(&file_name, &data) {
        Ok(mime_type) => {
            info!("{} uploaded a new logo", session.username);
            Json(LogoResponse {
                logo_url: branding.logo_url(),
                mime_type,
            })
            .into_response()
        }
        Err(BrandingError::Io(err)) => internal_error("Failed to store logo", err),
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

pub fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/repair", post(post_repair))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/promote", post(promote_user))
        .route("/users/{id}/demote", post(demote_user))
        .route("/stats", get(get_stats))
        .route("/audit", get(get_audit_log))
        .route(
            "/settings/logo",
            post(upload_logo).layer(DefaultBodyLimit::max(LOGO_UPLOAD_BODY_LIMIT)),
        )
}
