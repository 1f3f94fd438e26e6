//! API request/response models for customer premises devices (terminals and routers).

use super::pagination::Pagination;
use crate::db::models::devices::DeviceDBResponse;
use crate::types::{DeviceId, SubscriptionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "device_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
    Stowed,
    Updating,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,
    /// e.g. `terminal`, `router`
    pub device_type: String,
    pub device_name: Option<String>,
    pub starlink_id: Option<String>,
    pub serial_number: Option<String>,
    pub kit_number: Option<String>,
    pub software_version: Option<String>,
    /// Defaults to `offline`
    pub status: Option<DeviceStatus>,
    pub uptime_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    pub starlink_id: Option<String>,
    pub serial_number: Option<String>,
    pub kit_number: Option<String>,
    pub software_version: Option<String>,
    pub status: Option<DeviceStatus>,
    pub uptime_seconds: Option<i64>,
    /// Last time the device reported in. Left untouched when omitted.
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DeviceId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDevicesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return devices belonging to this user
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    /// Only return devices attached to this subscription
    #[param(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,

    /// Only return devices in this status
    pub status: Option<DeviceStatus>,
}

impl DeviceCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.device_type.trim().is_empty() {
            return Err("device_type must not be empty".to_string());
        }
        if self.uptime_seconds.is_some_and(|s| s < 0) {
            return Err("uptime_seconds must not be negative".to_string());
        }
        Ok(())
    }
}

impl DeviceUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.device_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("device_type must not be empty".to_string());
        }
        if self.uptime_seconds.is_some_and(|s| s < 0) {
            return Err("uptime_seconds must not be negative".to_string());
        }
        Ok(())
    }
}

impl From<DeviceDBResponse> for DeviceResponse {
    fn from(db: DeviceDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            subscription_id: db.subscription_id,
            device_type: db.device_type,
            device_name: db.device_name,
            starlink_id: db.starlink_id,
            serial_number: db.serial_number,
            kit_number: db.kit_number,
            software_version: db.software_version,
            status: db.status,
            uptime_seconds: db.uptime_seconds,
            last_updated: db.last_updated,
            created_at: db.created_at,
            updated_at: db.updated_at,
            user_name: db.user_name,
            user_email: db.user_email,
            subscription_name: db.subscription_name,
        }
    }
}
