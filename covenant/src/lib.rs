//! # covenant: account management API for satellite internet customers
//!
//! `covenant` is the backend behind a customer account portal. It exposes a JSON REST API for
//! the people on an account, their service subscriptions, hardware orders, invoices, stored
//! billing details and the terminals and routers installed at their service addresses.
//!
//! ## Overview
//!
//! Each resource gets the same five operations (list, create, get, update, delete) under
//! `/api`. On top of that:
//!
//! - The first user created becomes the account **owner**. Ownership can be handed to another
//!   user, and the owner cannot be deleted while anyone else remains on the account.
//! - Devices accept **telemetry samples** (speeds, latency, signal quality) at
//!   `/api/devices/{id}/metrics`, read back over a trailing window chosen by the `timeframe`
//!   query parameter. See [`timeframe`].
//! - Subscriptions, invoices, devices, orders and billing details returned by the API are
//!   joined with the owning user's email and name, and with the subscription nickname where
//!   one is linked.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Handlers in [`api`] validate the
//! request, convert it into a storage request and call the [`db::store::Store`] held in
//! [`AppState`]. Two stores exist:
//!
//! - [`db::postgres::PostgresStore`] runs each call through the per-table repositories in
//!   [`db::handlers`]; schema migrations run on startup.
//! - [`db::in_memory::InMemoryStore`] keeps everything in process, enforcing the same
//!   references, cascades and unique columns. It backs the test suite and `type: memory`
//!   deployments.
//!
//! Storage failures surface as [`db::errors::DbError`] and are mapped to HTTP statuses by
//! [`errors::Error`]; every error body has the shape `{"error": "<message>"}`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use covenant::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = covenant::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     covenant::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod timeframe;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::api::handlers::{billing, device_metrics, devices, health, invoices, orders, subscriptions, users};
use crate::config::{CorsOrigin, DatabaseConfig};
use crate::db::{in_memory::InMemoryStore, postgres::PostgresStore, store::Store};
use crate::openapi::ApiDoc;
use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{BillingInfoId, DeviceId, InvoiceId, OrderId, SubscriptionId, UserId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(Arc::new(InMemoryStore::new()))
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
}

/// Get the covenant database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the configured store. For PostgreSQL this connects the pool and runs migrations.
#[instrument(skip_all)]
pub async fn setup_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database {
        DatabaseConfig::Memory => {
            info!("Using in-memory store: data will be lost on shutdown");
            Ok(Arc::new(InMemoryStore::new()))
        }
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let db = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(pool.acquire_timeout)
                .idle_timeout(pool.idle_timeout)
                .max_lifetime(pool.max_lifetime)
                .connect(url)
                .await?;
            migrator().run(&db).await?;
            Ok(Arc::new(PostgresStore::new(db)))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;
    let allow_origin = if cors_config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Url serializes bare origins with a trailing slash, browsers send them without
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(max_age);
    }

    Ok(cors)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/profile/owner", get(users::get_owner))
        .route(
            "/users/{user_id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/{user_id}/owner", post(users::transfer_ownership))
        .route(
            "/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/{subscription_id}",
            get(subscriptions::get_subscription)
                .put(subscriptions::update_subscription)
                .delete(subscriptions::delete_subscription),
        )
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/orders/{order_id}",
            get(orders::get_order).put(orders::update_order).delete(orders::delete_order),
        )
        .route("/invoices", get(invoices::list_invoices).post(invoices::create_invoice))
        .route(
            "/invoices/{invoice_id}",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/devices", get(devices::list_devices).post(devices::create_device))
        .route(
            "/devices/{device_id}",
            get(devices::get_device).put(devices::update_device).delete(devices::delete_device),
        )
        .route(
            "/devices/{device_id}/metrics",
            get(device_metrics::list_device_metrics).post(device_metrics::record_device_metric),
        )
        .route(
            "/billing-info",
            get(billing::list_billing_info).post(billing::create_billing_info),
        )
        .route(
            "/billing-info/{billing_info_id}",
            get(billing::get_billing_info)
                .put(billing::update_billing_info)
                .delete(billing::delete_billing_info),
        )
}

/// Build the main application router with all endpoints and middleware.
///
/// - `/api/*` resource routes
/// - `/health` and `/` service routes
/// - OpenAPI JSON at `/api-docs/openapi.json` and the Scalar UI at `/docs`
/// - `/internal/metrics` when Prometheus metrics are enabled
/// - JSON 404 for everything else
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;
    let enable_metrics = state.config.enable_metrics;

    let mut router = Router::new()
        .nest("/api", api_routes())
        .route("/health", get(health::health))
        .route("/", get(health::index))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(health::not_found)
        .with_state(state)
        .layer(cors_layer);

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    store: Arc<dyn Store>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting covenant with configuration: {:#?}", config);

        let store = setup_store(&config).await?;
        let app_state = AppState::builder().store(store.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, store })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Covenant API listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing storage connections...");
        self.store.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::api::models::responses::{HealthResponse, ServiceIndex};
    use crate::config::{CorsConfig, CorsOrigin};
    use crate::test_utils::{create_test_app, create_test_config};
    use crate::{Application, create_cors_layer};
    use axum::http::{HeaderValue, StatusCode, header};
    use serde_json::Value;
    use url::Url;

    #[tokio::test]
    async fn test_health() {
        let server = create_test_app().await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        let health = response.json::<HealthResponse>();
        assert_eq!(health.status, "ok");
        assert_eq!(health.message, "Covenant API is running");
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let server = create_test_app().await;

        let index = server.get("/").await.json::<ServiceIndex>();
        assert_eq!(index.message, "Covenant API Server");
        assert_eq!(index.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(index.endpoints["users"], "/api/users");
        assert_eq!(index.endpoints["billing_info"], "/api/billing-info");
    }

    #[tokio::test]
    async fn test_unknown_routes_are_json_404() {
        let server = create_test_app().await;

        for path in ["/nope", "/api/satellites", "/api/users/a/b/c"] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::NOT_FOUND);
            assert_eq!(response.json::<Value>()["error"], "Route not found");
        }
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let server = create_test_app().await;

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc = response.json::<Value>();
        assert_eq!(doc["info"]["title"], "Covenant API");
        assert!(doc["paths"]["/devices/{device_id}/metrics"]["get"].is_object());
        assert!(doc["paths"].get("/health").is_none());

        server.get("/docs").await.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_router_serves_without_network() {
        use crate::db::in_memory::InMemoryStore;
        use crate::{AppState, build_router};
        use axum::body::Body;
        use axum::http::Request;
        use std::sync::Arc;
        use tower::ServiceExt;

        let state = AppState::builder()
            .store(Arc::new(InMemoryStore::new()))
            .config(create_test_config())
            .build();
        let router = build_router(state).unwrap();

        let response = router
            .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let server = create_test_app().await;
        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let mut config = create_test_config();
        config.cors = CorsConfig {
            allowed_origins: vec![CorsOrigin::Url(Url::parse("https://portal.example.com").unwrap())],
            allow_credentials: true,
            max_age: None,
        };
        assert!(create_cors_layer(&config).is_ok());

        let server = Application::new(config).await.unwrap().into_test_server();
        let response = server
            .get("/health")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://portal.example.com"))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            HeaderValue::from_static("https://portal.example.com")
        );
    }
}
