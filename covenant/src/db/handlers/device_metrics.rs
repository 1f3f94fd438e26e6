//! Database repository for device telemetry samples.
//!
//! Samples are append-only, so this is not a [`super::Repository`]: it can record a sample
//! and read a device's samples inside a trailing window.

use crate::types::{DeviceId, abbrev_uuid};
use crate::{
    api::models::device_metrics::MetricType,
    db::{
        errors::Result,
        models::device_metrics::{DeviceMetricCreateDBRequest, DeviceMetricDBResponse},
    },
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, query_builder::QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Samples recorded at or after `since`, optionally of a single type
#[derive(Debug, Clone)]
pub struct DeviceMetricFilter {
    pub since: DateTime<Utc>,
    pub metric_type: Option<MetricType>,
}

pub struct DeviceMetrics<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DeviceMetrics<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(device_id = %abbrev_uuid(&request.device_id), metric_type = ?request.metric_type), err)]
    pub async fn record(&mut self, request: &DeviceMetricCreateDBRequest) -> Result<DeviceMetricDBResponse> {
        let metric = sqlx::query_as::<_, DeviceMetricDBResponse>(
            r#"
            INSERT INTO device_metrics (id, device_id, metric_type, value, unit, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.device_id)
        .bind(request.metric_type)
        .bind(request.value)
        .bind(&request.unit)
        .bind(request.recorded_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(metric)
    }

    /// Oldest first, so charts can plot the result directly
    #[instrument(skip(self, filter), fields(device_id = %abbrev_uuid(&device_id), since = %filter.since), err)]
    pub async fn list_for_device(&mut self, device_id: DeviceId, filter: &DeviceMetricFilter) -> Result<Vec<DeviceMetricDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM device_metrics WHERE device_id = ");
        query.push_bind(device_id);
        query.push(" AND recorded_at >= ").push_bind(filter.since);
        if let Some(metric_type) = filter.metric_type {
            query.push(" AND metric_type = ").push_bind(metric_type);
        }
        query.push(" ORDER BY recorded_at ASC");

        let metrics = query
            .build_query_as::<DeviceMetricDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(metrics)
    }
}
