use super::state::ServerState;
use crate::user::{Permission, UserRole};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use rand::Rng;
use rand_distr::Alphanumeric;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, error};

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
const SESSION_TOKEN_LENGTH: usize = 64;

pub fn random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

struct StoredSession {
    user_id: String,
    created_at: i64,
}

/// Signed-in sessions, keyed by token. Kept in memory only: a restart signs
/// everybody out.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Starts a session for `user_id` and returns its token.
    pub async fn create(&self, user_id: &str) -> String {
        let token = random_string(SESSION_TOKEN_LENGTH);
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            StoredSession {
                user_id: user_id.to_string(),
                created_at: chrono::Utc::now().timestamp(),
            },
        );
        token
    }

    /// The user a token belongs to. Expired tokens are dropped.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        let now = chrono::Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(s) if now - s.created_at < SESSION_TTL_SECS => Some(s.user_id.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Ends every session of a user, returns how many there were.
    pub async fn remove_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    pub async fn cleanup_expired(&self) {
        let now = chrono::Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| now - s.created_at < SESSION_TTL_SECS);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The signed-in user of the current request. The role is read from the
/// database on every request, so promotions and demotions apply immediately.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
    pub token: String,
}

impl Session {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.permissions().contains(&permission)
    }
}

#[derive(Debug)]
pub enum SessionExtractionError {
    AccessDenied,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .map(|v| match v.strip_prefix("Bearer ") {
            Some(token) => token.to_string(),
            None => v,
        })
        .filter(|v| !v.is_empty())
}

async fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    let token = match extract_session_token_from_cookies(parts)
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return Ok(None);
        }
        Some(x) => x,
    };

    let user_id = match ctx.session_store.resolve(&token).await {
        Some(user_id) => user_id,
        None => {
            debug!("Unknown or expired session token");
            return Ok(None);
        }
    };

    match ctx.user_manager.get_preference(&user_id) {
        Ok(Some(preference)) => Ok(Some(Session {
            user_id: preference.user_id,
            username: preference.username,
            role: preference.role,
            token,
        })),
        Ok(None) => {
            debug!("Session for deleted user {}, dropping it", user_id);
            ctx.session_store.remove(&token).await;
            Ok(None)
        }
        Err(err) => {
            error!("Failed to load user {} for session: {:#}", user_id, err);
            Err(SessionExtractionError::InternalError)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await?
            .ok_or(SessionExtractionError::AccessDenied)
    }
}

impl FromRequestParts<ServerState> for Option<Session> {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}
