//! Database models for device telemetry. Samples are immutable once recorded.

use crate::api::models::device_metrics::{DeviceMetricCreate, MetricType};
use crate::types::{DeviceId, DeviceMetricId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DeviceMetricCreateDBRequest {
    pub device_id: DeviceId,
    pub metric_type: MetricType,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
}

impl DeviceMetricCreateDBRequest {
    pub fn new(device_id: DeviceId, api: DeviceMetricCreate) -> Self {
        Self {
            device_id,
            metric_type: api.metric_type,
            value: api.value,
            unit: api.unit.unwrap_or_else(|| api.metric_type.default_unit().to_string()),
            recorded_at: api.recorded_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DeviceMetricDBResponse {
    pub id: DeviceMetricId,
    pub device_id: DeviceId,
    pub metric_type: MetricType,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
}
