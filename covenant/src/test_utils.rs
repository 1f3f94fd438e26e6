//! Test helpers: an in-memory application behind an `axum_test::TestServer`.

use crate::api::models::users::UserResponse;
use crate::config::{Config, CorsConfig, DatabaseConfig};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig::Memory,
        cors: CorsConfig::default(),
        enable_metrics: false,
        enable_otel_export: false,
    }
}

/// Fresh application with an empty in-memory store.
pub async fn create_test_app() -> TestServer {
    crate::Application::new(create_test_config())
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// Create a user through the API. The first user created on a server becomes the owner.
pub async fn create_test_user(server: &TestServer, email: &str) -> UserResponse {
    let response = server
        .post("/api/users")
        .json(&json!({"email": email, "name": "Test User"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<UserResponse>()
}
