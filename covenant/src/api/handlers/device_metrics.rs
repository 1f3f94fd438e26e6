//! Device telemetry: samples are appended per device and read back over a trailing window.

use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::device_metrics::{DeviceMetricCreate, DeviceMetricResponse, DeviceMetricsQuery};
use crate::api::models::responses::ErrorResponse;
use crate::db::handlers::device_metrics::DeviceMetricFilter;
use crate::db::models::device_metrics::DeviceMetricCreateDBRequest;
use crate::errors::{Error, Result};
use crate::types::DeviceId;
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/devices/{device_id}/metrics",
    tag = "devices",
    summary = "Get device metrics",
    description = "Samples recorded within the trailing `timeframe`, oldest first. \
Unrecognised timeframes fall back to 15 minutes. An unknown device yields an empty list.",
    responses(
        (status = 200, description = "Telemetry samples in ascending time order", body = Vec<DeviceMetricResponse>),
        (status = 400, description = "Malformed device ID or metric type", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("device_id" = uuid::Uuid, Path, description = "Device ID"),
        DeviceMetricsQuery
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_device_metrics(
    State(state): State<AppState>,
    ApiPath(device_id): ApiPath<DeviceId>,
    ApiQuery(query): ApiQuery<DeviceMetricsQuery>,
) -> Result<Json<Vec<DeviceMetricResponse>>> {
    tracing::debug!(%device_id, timeframe = %query.timeframe, "Reading device telemetry");
    let filter = DeviceMetricFilter {
        since: query.timeframe.lower_bound(Utc::now()),
        metric_type: query.metric_type,
    };
    let metrics = state.store.list_device_metrics(device_id, &filter).await?;

    Ok(Json(metrics.into_iter().map(DeviceMetricResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/devices/{device_id}/metrics",
    tag = "devices",
    summary = "Record device metric",
    request_body = DeviceMetricCreate,
    responses(
        (status = 201, description = "Sample recorded", body = DeviceMetricResponse),
        (status = 400, description = "Invalid sample or unknown device", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("device_id" = uuid::Uuid, Path, description = "Device ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn record_device_metric(
    State(state): State<AppState>,
    ApiPath(device_id): ApiPath<DeviceId>,
    ApiJson(create): ApiJson<DeviceMetricCreate>,
) -> Result<(StatusCode, Json<DeviceMetricResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let metric = state
        .store
        .record_device_metric(&DeviceMetricCreateDBRequest::new(device_id, create))
        .await?;
    Ok((StatusCode::CREATED, Json(DeviceMetricResponse::from(metric))))
}

#[cfg(test)]
mod tests {
    use crate::api::models::device_metrics::{DeviceMetricResponse, MetricType};
    use crate::api::models::devices::DeviceResponse;
    use crate::test_utils::{create_test_app, create_test_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::json;

    async fn create_device(server: &TestServer) -> DeviceResponse {
        let user = create_test_user(server, "metrics@example.com").await;
        server
            .post("/api/devices")
            .json(&json!({"user_id": user.id, "device_type": "terminal"}))
            .await
            .json::<DeviceResponse>()
    }

    async fn record(server: &TestServer, device: &DeviceResponse, metric_type: &str, value: f64, age: Duration) {
        server
            .post(&format!("/api/devices/{}/metrics", device.id))
            .json(&json!({
                "metric_type": metric_type,
                "value": value,
                "recorded_at": Utc::now() - age
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    fn values(metrics: &[DeviceMetricResponse]) -> Vec<f64> {
        metrics.iter().map(|m| m.value).collect()
    }

    #[tokio::test]
    async fn test_record_defaults_unit_and_timestamp() {
        let server = create_test_app().await;
        let device = create_device(&server).await;

        let before = Utc::now();
        let response = server
            .post(&format!("/api/devices/{}/metrics", device.id))
            .json(&json!({"metric_type": "latency", "value": 28.5}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let metric = response.json::<DeviceMetricResponse>();
        assert_eq!(metric.metric_type, MetricType::Latency);
        assert_eq!(metric.unit, "ms");
        assert!(metric.recorded_at >= before);
    }

    #[tokio::test]
    async fn test_timeframe_window_is_ascending() {
        let server = create_test_app().await;
        let device = create_device(&server).await;

        record(&server, &device, "download_speed", 1.0, Duration::days(10)).await;
        record(&server, &device, "download_speed", 2.0, Duration::days(3)).await;
        record(&server, &device, "download_speed", 3.0, Duration::hours(2)).await;
        record(&server, &device, "download_speed", 4.0, Duration::minutes(5)).await;

        let week = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .add_query_param("timeframe", "7days")
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&week), vec![2.0, 3.0, 4.0]);

        let month = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .add_query_param("timeframe", "30days")
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&month), vec![1.0, 2.0, 3.0, 4.0]);

        let three_hours = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .add_query_param("timeframe", "3hours")
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&three_hours), vec![3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_unknown_or_missing_timeframe_is_fifteen_minutes() {
        let server = create_test_app().await;
        let device = create_device(&server).await;

        record(&server, &device, "upload_speed", 1.0, Duration::hours(1)).await;
        record(&server, &device, "upload_speed", 2.0, Duration::minutes(1)).await;

        let unknown = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .add_query_param("timeframe", "1 year; DROP TABLE devices")
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&unknown), vec![2.0]);

        let padded = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .add_query_param("timeframe", " 7days ")
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&padded), vec![2.0]);

        let missing = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&missing), vec![2.0]);
    }

    #[tokio::test]
    async fn test_metric_type_filter() {
        let server = create_test_app().await;
        let device = create_device(&server).await;

        record(&server, &device, "latency", 30.0, Duration::minutes(3)).await;
        record(&server, &device, "download_speed", 150.0, Duration::minutes(2)).await;

        let latency = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .add_query_param("metric_type", "latency")
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert_eq!(values(&latency), vec![30.0]);
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let server = create_test_app().await;
        let missing = uuid::Uuid::new_v4();

        let response = server.get(&format!("/api/devices/{missing}/metrics")).await;
        response.assert_status_ok();
        assert!(response.json::<Vec<DeviceMetricResponse>>().is_empty());

        server
            .post(&format!("/api/devices/{missing}/metrics"))
            .json(&json!({"metric_type": "latency", "value": 1.0}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deleting_device_removes_metrics() {
        let server = create_test_app().await;
        let device = create_device(&server).await;
        record(&server, &device, "signal_quality", 98.0, Duration::minutes(1)).await;

        server.delete(&format!("/api/devices/{}", device.id)).await.assert_status_ok();

        let metrics = server
            .get(&format!("/api/devices/{}/metrics", device.id))
            .await
            .json::<Vec<DeviceMetricResponse>>();
        assert!(metrics.is_empty());
    }
}
