//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per endpoint. When API routes or request
//! formats change, update only this file.

use super::constants::*;
use super::server::TestServer;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    /// Creates a client without a session.
    pub fn new(base_url: String) -> Self {
        Self::build(base_url, None)
    }

    /// Creates a client that sends `token` on every request.
    pub fn with_token(base_url: String, token: &str) -> Self {
        Self::build(base_url, Some(token))
    }

    fn build(base_url: String, token: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(token).expect("Invalid token header"),
            );
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Client signed in as the regular member.
    pub async fn authenticated(server: &TestServer) -> Self {
        let token = server.sign_in(TEST_SUBJECT, TEST_USER, &[]).await;
        Self::with_token(server.base_url.clone(), &token)
    }

    /// Client signed in as the admin.
    pub async fn authenticated_admin(server: &TestServer) -> Self {
        let token = server.sign_in(ADMIN_SUBJECT, ADMIN_USER, &[]).await;
        Self::with_token(server.base_url.clone(), &token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    // ========================================================================
    // Home & Authentication
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    /// GET /auth/login
    pub async fn login(&self) -> Response {
        self.get("/auth/login").await
    }

    /// GET /auth/logout
    pub async fn logout(&self) -> Response {
        self.get("/auth/logout").await
    }

    /// GET /v1/me
    pub async fn get_me(&self) -> Response {
        self.get("/v1/me").await
    }

    /// PUT /v1/me/theme
    pub async fn set_theme(&self, theme: &str) -> Response {
        self.put_json("/v1/me/theme", &json!({ "theme": theme }))
            .await
    }

    // ========================================================================
    // Movies
    // ========================================================================

    /// GET /v1/movies with optional filters
    pub async fn list_movies(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/v1/movies"))
            .query(query)
            .send()
            .await
            .expect("List movies request failed")
    }

    /// POST /v1/movies
    pub async fn add_movie(&self, movie: Value) -> Response {
        self.post_json("/v1/movies", &movie).await
    }

    /// POST /v1/movies, returning the new id
    pub async fn add_movie_id(&self, movie: Value) -> i64 {
        let response = self.add_movie(movie).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.expect("Invalid JSON");
        body["id"].as_i64().expect("Missing id")
    }

    /// GET /v1/movies/{id}
    pub async fn get_movie(&self, id: i64) -> Response {
        self.get(&format!("/v1/movies/{}", id)).await
    }

    /// PUT /v1/movies/{id}
    pub async fn update_movie(&self, id: i64, movie: Value) -> Response {
        self.put_json(&format!("/v1/movies/{}", id), &movie).await
    }

    /// DELETE /v1/movies/{id}
    pub async fn delete_movie(&self, id: i64) -> Response {
        self.delete(&format!("/v1/movies/{}", id)).await
    }

    /// GET /v1/search/local?q=
    pub async fn local_search(&self, q: &str) -> Response {
        self.client
            .get(self.url("/v1/search/local"))
            .query(&[("q", q)])
            .send()
            .await
            .expect("Local search request failed")
    }

    /// GET /v1/search/media?title=
    pub async fn search_media(&self, title: &str) -> Response {
        self.client
            .get(self.url("/v1/search/media"))
            .query(&[("title", title)])
            .send()
            .await
            .expect("Media search request failed")
    }

    /// GET /v1/media/details?source=&id=
    pub async fn media_details(&self, source: &str, id: &str) -> Response {
        self.client
            .get(self.url("/v1/media/details"))
            .query(&[("source", source), ("id", id)])
            .send()
            .await
            .expect("Media details request failed")
    }

    // ========================================================================
    // Wishlist
    // ========================================================================

    /// GET /v1/wishlist
    pub async fn get_wishlist(&self) -> Response {
        self.get("/v1/wishlist").await
    }

    /// POST /v1/wishlist
    pub async fn add_wishlist_item(&self, item: Value) -> Response {
        self.post_json("/v1/wishlist", &item).await
    }

    /// DELETE /v1/wishlist/{id}
    pub async fn delete_wishlist_item(&self, id: i64) -> Response {
        self.delete(&format!("/v1/wishlist/{}", id)).await
    }

    /// POST /v1/wishlist/{id}/move
    pub async fn move_wishlist_item(&self, id: i64) -> Response {
        self.client
            .post(self.url(&format!("/v1/wishlist/{}/move", id)))
            .send()
            .await
            .expect("Move request failed")
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// GET /v1/settings
    pub async fn get_settings(&self) -> Response {
        self.get("/v1/settings").await
    }

    /// PUT /v1/settings/edit-mode
    pub async fn set_edit_mode(&self, enabled: bool) -> Response {
        self.put_json("/v1/settings/edit-mode", &json!({ "enabled": enabled }))
            .await
    }

    // ========================================================================
    // Admin
    // ========================================================================

    /// GET /v1/admin/health
    pub async fn get_health(&self) -> Response {
        self.get("/v1/admin/health").await
    }

    /// POST /v1/admin/health/repair
    pub async fn repair_schema(&self) -> Response {
        self.client
            .post(self.url("/v1/admin/health/repair"))
            .send()
            .await
            .expect("Repair request failed")
    }

    /// GET /v1/admin/users
    pub async fn list_users(&self) -> Response {
        self.get("/v1/admin/users").await
    }

    /// POST /v1/admin/users/{id}/promote
    pub async fn promote_user(&self, user_id: &str) -> Response {
        self.client
            .post(self.url(&format!("/v1/admin/users/{}/promote", user_id)))
            .send()
            .await
            .expect("Promote request failed")
    }

    /// POST /v1/admin/users/{id}/demote
    pub async fn demote_user(&self, user_id: &str) -> Response {
        self.client
            .post(self.url(&format!("/v1/admin/users/{}/demote", user_id)))
            .send()
            .await
            .expect("Demote request failed")
    }

    /// DELETE /v1/admin/users/{id}
    pub async fn delete_user(&self, user_id: &str) -> Response {
        self.delete(&format!("/v1/admin/users/{}", user_id)).await
    }

    /// GET /v1/admin/stats
    pub async fn get_stats(&self) -> Response {
        self.get("/v1/admin/stats").await
    }

    /// GET /v1/admin/audit?q=
    pub async fn get_audit(&self, q: Option<&str>) -> Response {
        let mut request = self.client.get(self.url("/v1/admin/audit"));
        if let Some(q) = q {
            request = request.query(&[("q", q)]);
        }
        request.send().await.expect("Audit request failed")
    }

    /// POST /v1/admin/settings/logo
    pub async fn upload_logo(&self, file_name: &str, data: Vec<u8>) -> Response {
        let part = Part::bytes(data).file_name(file_name.to_string());
        let form = Form::new().part("logo", part);
        self.client
            .post(self.url("/v1/admin/settings/logo"))
            .multipart(form)
            .send()
            .await
            .expect("Logo upload failed")
    }

    /// GET /branding/logo
    pub async fn get_logo(&self) -> Response {
        self.get("/branding/logo").await
    }
}
