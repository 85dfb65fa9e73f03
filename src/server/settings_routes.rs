//! Own preferences and application settings.

use super::responses::{error_response, forbidden, internal_error, not_found};
use super::session::Session;
use super::state::{GuardedSettingsStore, ServerState};
use crate::user::{Permission, UserPreference};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

const SECRET_SETTING_SUFFIX: &str = "_api_key";

#[derive(Serialize, Debug)]
struct MeResponse {
    #[serde(flatten)]
    preference: UserPreference,
    /// None when no custom logo was uploaded.
    logo_url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ThemeBody {
    theme: String,
}

#[derive(Deserialize, Serialize, Debug)]
struct EditModeBody {
    enabled: bool,
}

/// API keys stored as settings are only shown to admins.
fn visible_settings(
    settings: BTreeMap<String, String>,
    show_secrets: bool,
) -> BTreeMap<String, String> {
    settings
        .into_iter()
        .filter(|(key, _)| show_secrets || !key.ends_with(SECRET_SETTING_SUFFIX))
        .collect()
}

/// GET /me
async fn get_me(session: Session, State(state): State<ServerState>) -> Response {
    match state.user_manager.get_preference(&session.user_id) {
        Ok(Some(preference)) => Json(MeResponse {
            preference,
            logo_url: state.branding_store.logo_url(),
        })
        .into_response(),
        Ok(None) => not_found("User"),
        Err(err) => internal_error("Failed to load preferences", err),
    }
}

/// PUT /me/theme
async fn put_theme(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<ThemeBody>,
) -> Response {
    let theme = body.theme.trim();
    if theme.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Theme must not be empty");
    }
    match state.user_manager.set_theme(&session.user_id, theme) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("User"),
        Err(err) => internal_error("Failed to save theme", err),
    }
}

/// GET /settings
async fn get_settings(session: Session, State(settings): State<GuardedSettingsStore>) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }
    match settings.all_settings() {
        Ok(all) => Json(visible_settings(
            all,
            session.has_permission(Permission::ServerAdmin),
        ))
        .into_response(),
        Err(err) => internal_error("Failed to read settings", err),
    }
}

/// PUT /settings/edit-mode - Admins only
async fn put_edit_mode(
    session: Session,
    State(settings): State<GuardedSettingsStore>,
    Json(body): Json<EditModeBody>,
) -> Response {
    if !session.has_permission(Permission::ServerAdmin) {
        return forbidden();
    }
    match settings.set_edit_mode(body.enabled) {
        Ok(()) => {
            info!(
                "{} turned edit mode {}",
                session.username,
                if body.enabled { "on" } else { "off" }
            );
            Json(body).into_response()
        }
        Err(err) => internal_error("Failed to save edit mode", err),
    }
}

pub fn settings_routes() -> Router<ServerState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/theme", put(put_theme))
        .route("/settings", get(get_settings))
        .route("/settings/edit-mode", put(put_edit_mode))
}
