//! OpenID Connect login for Hylla: authorization code flow with PKCE. The
//! pending login state lives in memory between `/auth/login` and
//! `/auth/callback`.

use anyhow::{anyhow, bail, Context, Result};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreIdTokenClaims, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::OidcConfig;
use crate::user::IdentityClaims;

/// Pending logins older than this are rejected.
const AUTH_STATE_TTL_SECS: i64 = 300;

// Discovery and token requests must not follow redirects.
fn provider_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    Ok(client)
}

type ConfiguredClient = CoreClient<
    openidconnect::EndpointSet,
    openidconnect::EndpointNotSet,
    openidconnect::EndpointNotSet,
    openidconnect::EndpointNotSet,
    openidconnect::EndpointMaybeSet,
    openidconnect::EndpointMaybeSet,
>;

/// State stored between the redirect to the provider and the callback.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub csrf_token: String,
    pub nonce: String,
    /// PKCE code verifier, never leaves the server.
    pub pkce_verifier: String,
    pub created_at: i64,
}

/// Result of a successful code exchange.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub subject: String,
    pub email: Option<String>,
    pub preferred_username: Option<String>,
    /// Value of the non-standard `groups` claim, empty when absent.
    pub groups: Vec<String>,
}

impl AuthResult {
    pub fn into_claims(self) -> IdentityClaims {
        IdentityClaims {
            subject: self.subject,
            preferred_username: self.preferred_username,
            email: self.email,
            groups: self.groups,
        }
    }
}

pub struct OidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
    redirect_url: RedirectUrl,
    scopes: Vec<String>,
}

impl OidcClient {
    /// Discovers the provider. Fails when the provider is unreachable or
    /// the configured URLs are invalid.
    pub async fn new(config: OidcConfig) -> Result<Self> {
        info!("Discovering identity provider at {}", config.provider_url);

        let issuer = IssuerUrl::new(config.provider_url.clone())
            .with_context(|| format!("Bad provider_url {:?}", config.provider_url))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .with_context(|| format!("Bad redirect_uri {:?}", config.redirect_uri))?;

        let http = provider_http_client()?;
        let provider_metadata = CoreProviderMetadata::discover_async(issuer, &http)
            .await
            .context("Identity provider discovery failed")?;

        info!("Identity provider ready, client id {}", config.client_id);
        Ok(Self {
            provider_metadata,
            client_id: ClientId::new(config.client_id),
            client_secret: config
                .client_secret
                .filter(|secret| !secret.is_empty())
                .map(ClientSecret::new),
            redirect_url,
            scopes: config.scopes,
        })
    }

    fn core_client(&self) -> ConfiguredClient {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }

    /// Returns the URL to redirect the user to, along with the state to keep
    /// server-side until the callback.
    pub fn authorize_url(&self) -> Result<(String, AuthState)> {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        // The library always asks for "openid" on its own.
        let extra_scopes = self
            .scopes
            .iter()
            .filter(|scope| scope.as_str() != "openid")
            .map(|scope| Scope::new(scope.clone()));

        let client = self.core_client();
        let (url, csrf, nonce) = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scopes(extra_scopes)
            .set_pkce_challenge(challenge)
            .url();

        let pending = AuthState {
            csrf_token: csrf.into_secret(),
            nonce: nonce.secret().clone(),
            pkce_verifier: verifier.into_secret(),
            created_at: chrono::Utc::now().timestamp(),
        };
        debug!("Login started, state {}", pending.csrf_token);

        Ok((url.to_string(), pending))
    }

    /// Exchanges an authorization code, verifies the ID token and returns the
    /// identity claims.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        stored_state: &AuthState,
    ) -> Result<AuthResult> {
        if state != stored_state.csrf_token {
            bail!("Callback state does not match the pending login");
        }
        if chrono::Utc::now().timestamp() - stored_state.created_at > AUTH_STATE_TTL_SECS {
            bail!("Pending login is older than {}s", AUTH_STATE_TTL_SECS);
        }

        let client = self.core_client();
        let http = provider_http_client()?;
        let tokens = client
            .exchange_code(AuthorizationCode::new(code.to_string()))?
            .set_pkce_verifier(PkceCodeVerifier::new(stored_state.pkce_verifier.clone()))
            .request_async(&http)
            .await
            .map_err(|e| anyhow!("Token request rejected: {}", e))?;

        let Some(id_token) = tokens.id_token() else {
            bail!("Token response carries no id_token");
        };
        let verifier = client.id_token_verifier();
        let claims: &CoreIdTokenClaims = id_token
            .claims(&verifier, &Nonce::new(stored_state.nonce.clone()))
            .map_err(|e| anyhow!("ID token rejected: {}", e))?;

        let subject = claims.subject().to_string();
        let email = claims.email().map(|address| address.to_string());
        let preferred_username = claims
            .preferred_username()
            .map(|name| name.as_str().to_string());
        // The token signature is already verified above.
        let groups = extract_groups_claim(&id_token.to_string());

        debug!(
            "Authenticated subject {} with {} group(s)",
            subject,
            groups.len()
        );

        Ok(AuthResult {
            subject,
            email,
            preferred_username,
            groups,
        })
    }
}

/// Reads the `groups` claim from a JWT payload. Accepts either an array of
/// strings or a single string. Returns an empty list if the token is malformed
/// or the claim is missing.
fn extract_groups_claim(jwt: &str) -> Vec<String> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut segments = jwt.split('.');
    let (Some(_), Some(encoded), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Vec::new();
    };
    let Some(payload) = URL_SAFE_NO_PAD
        .decode(encoded)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
    else {
        return Vec::new();
    };

    match payload.get("groups") {
        Some(serde_json::Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        Some(serde_json::Value::String(group)) => vec![group.clone()],
        _ => Vec::new(),
    }
}

/// In-memory storage for pending logins, keyed by CSRF token.
pub struct AuthStateStore {
    states: RwLock<HashMap<String, AuthState>>,
}

impl AuthStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    pub async fn store(&self, pending: AuthState) {
        self.states
            .write()
            .await
            .insert(pending.csrf_token.clone(), pending);
    }

    /// Removes and returns a pending login. Each state is usable once.
    pub async fn take(&self, csrf_token: &str) -> Option<AuthState> {
        self.states.write().await.remove(csrf_token)
    }

    pub async fn cleanup_expired(&self) {
        let cutoff = chrono::Utc::now().timestamp() - AUTH_STATE_TTL_SECS;
        self.states
            .write()
            .await
            .retain(|_, pending| pending.created_at > cutoff);
    }
}

impl Default for AuthStateStore {
    fn default() -> Self {
        Self::new()
    }
}
