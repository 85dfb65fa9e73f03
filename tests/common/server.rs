//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database directory.

use super::constants::*;
use hylla_server::config::{AppConfig, CliConfig};
use hylla_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use hylla_server::user::IdentityClaims;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database.
///
/// When dropped, the server shuts down and the temp directory is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub port: u16,

    /// Shared state of the running server, for direct store access in tests
    pub state: ServerState,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, with a ready schema and
    /// the admin and member identities already known.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");

        let cli_config = CliConfig {
            db_dir: Some(temp_db_dir.path().to_path_buf()),
            ..Default::default()
        };
        let app_config = AppConfig::resolve(&cli_config, None).expect("Failed to resolve config");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };
        let state = ServerState::new(config, &app_config, None);
        let report = state.schema_guardian.ensure_schema();
        assert!(report.is_healthy(), "Schema setup failed: {:?}", report);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = make_app(state.clone());

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            state,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        // Order matters: the first identity ever seen becomes admin.
        server.sign_in(ADMIN_SUBJECT, ADMIN_USER, &[]).await;
        server.sign_in(TEST_SUBJECT, TEST_USER, &[]).await;

        server.wait_for_ready().await;
        server
    }

    /// Does what the login callback does after a successful code exchange
    /// and returns the session token.
    pub async fn sign_in(&self, subject: &str, username: &str, groups: &[&str]) -> String {
        let claims = IdentityClaims {
            subject: subject.to_string(),
            preferred_username: Some(username.to_string()),
            email: Some(format!("{}@example.com", username)),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        };
        let preference = self
            .state
            .user_manager
            .resolve_on_login(&claims)
            .expect("Failed to resolve test identity");
        self.state.session_store.create(&preference.user_id).await
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
