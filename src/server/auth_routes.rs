//! OpenID Connect login flow and logout.

use super::responses::{error_response, internal_error};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::{GuardedAuthStateStore, GuardedSessionStore, OptionalOidcClient, ServerState};

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

const OIDC_NOT_CONFIGURED: &str = "Login is not configured on this server";

#[derive(Deserialize, Debug)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build()
}

/// GET /auth/login - Redirect to the identity provider
async fn login(
    State(oidc_client): State<OptionalOidcClient>,
    State(auth_states): State<GuardedAuthStateStore>,
) -> Response {
    let Some(client) = oidc_client else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, OIDC_NOT_CONFIGURED);
    };

    auth_states.cleanup_expired().await;
    match client.authorize_url() {
        Ok((url, pending)) => {
            auth_states.store(pending).await;
            Redirect::to(&url).into_response()
        }
        Err(err) => internal_error("Failed to start login", err),
    }
}

/// GET /auth/callback - Finish the login and start a session
async fn callback(State(state): State<ServerState>, Query(params): Query<CallbackParams>) -> Response {
    let Some(client) = state.oidc_client.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, OIDC_NOT_CONFIGURED);
    };

    if let Some(err) = params.error {
        warn!(
            "Identity provider refused the login: {} ({})",
            err,
            params.error_description.as_deref().unwrap_or("no description")
        );
        return error_response(StatusCode::UNAUTHORIZED, format!("Login failed: {}", err));
    }

    let (Some(code), Some(csrf_token)) = (params.code, params.state) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing code or state");
    };

    let Some(pending) = state.auth_state_store.take(&csrf_token).await else {
        warn!("Callback with unknown login state");
        return error_response(StatusCode::BAD_REQUEST, "Unknown or expired login attempt");
    };

    let auth_result = match client.exchange_code(&code, &csrf_token, &pending).await {
        Ok(result) => result,
        Err(err) => {
            warn!("Login failed: {:#}", err);
            return error_response(StatusCode::UNAUTHORIZED, "Login failed");
        }
    };

    let preference = match state.user_manager.resolve_on_login(&auth_result.into_claims()) {
        Ok(preference) => preference,
        Err(err) => return internal_error("Failed to resolve user", err),
    };

    let token = state.session_store.create(&preference.user_id).await;
    info!(
        "User {} signed in as {}",
        preference.username,
        preference.role.as_str()
    );

    (
        [(SET_COOKIE, session_cookie(token).to_string())],
        Redirect::to("/"),
    )
        .into_response()
}

/// GET /auth/logout - End the current session
async fn logout(State(sessions): State<GuardedSessionStore>, session: Session) -> Response {
    sessions.remove(&session.token).await;
    info!("User {} signed out", session.username);
    (
        StatusCode::OK,
        [(SET_COOKIE, expired_session_cookie().to_string())],
    )
        .into_response()
}

pub fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout))
}
