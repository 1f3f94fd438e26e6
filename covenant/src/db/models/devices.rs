//! Database models for devices.

use crate::api::models::devices::{DeviceCreate, DeviceStatus, DeviceUpdate};
use crate::types::{DeviceId, SubscriptionId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DeviceCreateDBRequest {
    pub user_id: UserId,
    pub subscription_id: Option<SubscriptionId>,
    pub device_type: String,
    pub device_name: Option<String>,
    pub starlink_id: Option<String>,
    pub serial_number: Option<String>,
    pub kit_number: Option<String>,
    pub software_version: Option<String>,
    pub status: DeviceStatus,
    pub uptime_seconds: i64,
}

impl From<DeviceCreate> for DeviceCreateDBRequest {
    fn from(api: DeviceCreate) -> Self {
        Self {
            user_id: api.user_id,
            subscription_id: api.subscription_id,
            device_type: api.device_type,
            device_name: api.device_name,
            starlink_id: api.starlink_id,
            serial_number: api.serial_number,
            kit_number: api.kit_number,
            software_version: api.software_version,
            status: api.status.unwrap_or_default(),
            uptime_seconds: api.uptime_seconds.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceUpdateDBRequest {
    pub subscription_id: Option<SubscriptionId>,
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    pub starlink_id: Option<String>,
    pub serial_number: Option<String>,
    pub kit_number: Option<String>,
    pub software_version: Option<String>,
    pub status: Option<DeviceStatus>,
    pub uptime_seconds: Option<i64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<DeviceUpdate> for DeviceUpdateDBRequest {
    fn from(api: DeviceUpdate) -> Self {
        Self {
            subscription_id: api.subscription_id,
            device_type: api.device_type,
            device_name: api.device_name,
            starlink_id: api.starlink_id,
            serial_number: api.serial_number,
            kit_number: api.kit_number,
            software_version: api.software_version,
            status: api.status,
            uptime_seconds: api.uptime_seconds,
            last_updated: api.last_updated,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DeviceDBResponse {
    pub id: DeviceId,
    pub user_id: UserId,
    pub subscription_id: Option<SubscriptionId>,
    pub device_type: String,
    pub device_name: Option<String>,
    pub starlink_id: Option<String>,
    pub serial_number: Option<String>,
    pub kit_number: Option<String>,
    pub software_version: Option<String>,
    pub status: DeviceStatus,
    pub uptime_seconds: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
    #[sqlx(default)]
    pub subscription_name: Option<String>,
}
