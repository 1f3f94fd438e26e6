//! Database repository for devices.

use crate::types::{DeviceId, SubscriptionId, UserId, abbrev_uuid};
use crate::{
    api::models::devices::DeviceStatus,
    db::{
        errors::Result,
        handlers::repository::{Repository, push_pagination},
        models::devices::{DeviceCreateDBRequest, DeviceDBResponse, DeviceUpdateDBRequest},
    },
};
use sqlx::{PgConnection, query_builder::QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const SELECT_WITH_JOINS: &str = r#"
    SELECT d.*, u.name AS user_name, u.email AS user_email, s.nickname AS subscription_name
    FROM devices d
    LEFT JOIN users u ON u.id = d.user_id
    LEFT JOIN subscriptions s ON s.id = d.subscription_id
"#;

/// Filter for listing devices
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub user_id: Option<UserId>,
    pub subscription_id: Option<SubscriptionId>,
    pub status: Option<DeviceStatus>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl DeviceFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, ..Default::default() }
    }
}

pub struct Devices<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Devices<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Devices<'c> {
    type CreateRequest = DeviceCreateDBRequest;
    type UpdateRequest = DeviceUpdateDBRequest;
    type Response = DeviceDBResponse;
    type Id = DeviceId;
    type Filter = DeviceFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), device_type = %request.device_type), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let device = sqlx::query_as::<_, DeviceDBResponse>(
            r#"
            INSERT INTO devices (
                id, user_id, subscription_id, device_type, device_name, starlink_id, serial_number,
                kit_number, software_version, status, uptime_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.subscription_id)
        .bind(&request.device_type)
        .bind(&request.device_name)
        .bind(&request.starlink_id)
        .bind(&request.serial_number)
        .bind(&request.kit_number)
        .bind(&request.software_version)
        .bind(request.status)
        .bind(request.uptime_seconds)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(device)
    }

    #[instrument(skip(self), fields(device_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let device = sqlx::query_as::<_, DeviceDBResponse>(&format!("{SELECT_WITH_JOINS} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(device)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_WITH_JOINS);
        query.push(" WHERE TRUE");
        if let Some(user_id) = filter.user_id {
            query.push(" AND d.user_id = ").push_bind(user_id);
        }
        if let Some(subscription_id) = filter.subscription_id {
            query.push(" AND d.subscription_id = ").push_bind(subscription_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND d.status = ").push_bind(status);
        }
        query.push(" ORDER BY d.created_at DESC");
        push_pagination(&mut query, filter.skip, filter.limit);

        let devices = query.build_query_as::<DeviceDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(devices)
    }

    #[instrument(skip(self), fields(device_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(device_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let device = sqlx::query_as::<_, DeviceDBResponse>(
            r#"
            UPDATE devices SET
                subscription_id = COALESCE($2, subscription_id),
                device_type = COALESCE($3, device_type),
                device_name = COALESCE($4, device_name),
                starlink_id = COALESCE($5, starlink_id),
                serial_number = COALESCE($6, serial_number),
                kit_number = COALESCE($7, kit_number),
                software_version = COALESCE($8, software_version),
                status = COALESCE($9, status),
                uptime_seconds = COALESCE($10, uptime_seconds),
                last_updated = COALESCE($11, last_updated),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.subscription_id)
        .bind(&request.device_type)
        .bind(&request.device_name)
        .bind(&request.starlink_id)
        .bind(&request.serial_number)
        .bind(&request.kit_number)
        .bind(&request.software_version)
        .bind(request.status)
        .bind(request.uptime_seconds)
        .bind(request.last_updated)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(device)
    }
}
