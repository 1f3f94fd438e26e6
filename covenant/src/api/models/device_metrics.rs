//! API request/response models for device telemetry samples.

use crate::db::models::device_metrics::DeviceMetricDBResponse;
use crate::timeframe::Timeframe;
use crate::types::{DeviceId, DeviceMetricId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "metric_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    DownloadSpeed,
    UploadSpeed,
    Latency,
    UptimePercent,
    SignalQuality,
}

impl MetricType {
    /// Unit recorded when a sample is posted without one
    pub fn default_unit(&self) -> &'static str {
        match self {
            MetricType::DownloadSpeed | MetricType::UploadSpeed => "Mbps",
            MetricType::Latency => "ms",
            MetricType::UptimePercent | MetricType::SignalQuality => "%",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceMetricCreate {
    pub metric_type: MetricType,
    pub value: f64,
    /// Defaults to the metric type's natural unit (Mbps, ms or %)
    pub unit: Option<String>,
    /// Backfill timestamp; defaults to now
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceMetricResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DeviceMetricId,
    #[schema(value_type = String, format = "uuid")]
    pub device_id: DeviceId,
    pub metric_type: MetricType,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
}

/// Query parameters for reading a device's telemetry
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceMetricsQuery {
    /// Trailing window: `15min` (default), `3hours`, `1day`, `7days` or `30days`.
    /// Unrecognised values fall back to `15min`.
    #[serde(default)]
    #[param(value_type = Option<String>, example = "7days")]
    pub timeframe: Timeframe,

    /// Only return samples of this type
    pub metric_type: Option<MetricType>,
}

impl DeviceMetricCreate {
    pub fn validate(&self) -> Result<(), String> {
        if !self.value.is_finite() {
            return Err("value must be a finite number".to_string());
        }
        if self.unit.as_deref().is_some_and(|unit| unit.trim().is_empty()) {
            return Err("unit must not be empty".to_string());
        }
        Ok(())
    }
}

impl From<DeviceMetricDBResponse> for DeviceMetricResponse {
    fn from(db: DeviceMetricDBResponse) -> Self {
        Self {
            id: db.id,
            device_id: db.device_id,
            metric_type: db.metric_type,
            value: db.value,
            unit: db.unit,
            recorded_at: db.recorded_at,
        }
    }
}
