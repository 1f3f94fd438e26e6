//! Liveness probe, service banner and the catch-all 404.

use crate::api::models::responses::{ErrorResponse, HealthResponse, ServiceIndex};
use axum::{Json, http::StatusCode};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Covenant API is running".to_string(),
    })
}

pub async fn index() -> Json<ServiceIndex> {
    let endpoints = [
        ("users", "/api/users"),
        ("subscriptions", "/api/subscriptions"),
        ("orders", "/api/orders"),
        ("invoices", "/api/invoices"),
        ("devices", "/api/devices"),
        ("billing_info", "/api/billing-info"),
        ("docs", "/docs"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(ServiceIndex {
        message: "Covenant API Server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Route not found".to_string(),
        }),
    )
}
