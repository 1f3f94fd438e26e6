//! Database models for subscriptions.

use crate::api::models::subscriptions::{
    DEFAULT_IP_POLICY, DEFAULT_MONTHLY_DATA_GB, SubscriptionCreate, SubscriptionStatus, SubscriptionUpdate,
};
use crate::types::{SubscriptionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a subscription, with defaults already applied
#[derive(Debug, Clone)]
pub struct SubscriptionCreateDBRequest {
    pub user_id: UserId,
    pub subscription_number: String,
    pub nickname: Option<String>,
    pub service_location: Option<String>,
    pub service_plan: Option<String>,
    pub status: SubscriptionStatus,
    pub ip_policy: String,
    pub monthly_data_gb: i32,
    pub data_used_gb: f64,
    pub auto_top_up: bool,
    pub billing_cycle_start: Option<NaiveDate>,
    pub billing_cycle_end: Option<NaiveDate>,
}

impl From<SubscriptionCreate> for SubscriptionCreateDBRequest {
    fn from(api: SubscriptionCreate) -> Self {
        Self {
            user_id: api.user_id,
            subscription_number: api.subscription_number,
            nickname: api.nickname,
            service_location: api.service_location,
            service_plan: api.service_plan,
            status: api.status.unwrap_or_default(),
            ip_policy: api.ip_policy.unwrap_or_else(|| DEFAULT_IP_POLICY.to_string()),
            monthly_data_gb: api.monthly_data_gb.unwrap_or(DEFAULT_MONTHLY_DATA_GB),
            data_used_gb: api.data_used_gb.unwrap_or(0.0),
            auto_top_up: api.auto_top_up.unwrap_or(false),
            billing_cycle_start: api.billing_cycle_start,
            billing_cycle_end: api.billing_cycle_end,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdateDBRequest {
    pub user_id: Option<UserId>,
    pub subscription_number: Option<String>,
    pub nickname: Option<String>,
    pub service_location: Option<String>,
    pub service_plan: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub ip_policy: Option<String>,
    pub monthly_data_gb: Option<i32>,
    pub data_used_gb: Option<f64>,
    pub auto_top_up: Option<bool>,
    pub billing_cycle_start: Option<NaiveDate>,
    pub billing_cycle_end: Option<NaiveDate>,
}

impl From<SubscriptionUpdate> for SubscriptionUpdateDBRequest {
    fn from(api: SubscriptionUpdate) -> Self {
        Self {
            user_id: api.user_id,
            subscription_number: api.subscription_number,
            nickname: api.nickname,
            service_location: api.service_location,
            service_plan: api.service_plan,
            status: api.status,
            ip_policy: api.ip_policy,
            monthly_data_gb: api.monthly_data_gb,
            data_used_gb: api.data_used_gb,
            auto_top_up: api.auto_top_up,
            billing_cycle_start: api.billing_cycle_start,
            billing_cycle_end: api.billing_cycle_end,
        }
    }
}

/// Database response for a subscription. The `user_*` columns only come back from joined reads.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionDBResponse {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub subscription_number: String,
    pub nickname: Option<String>,
    pub service_location: Option<String>,
    pub service_plan: Option<String>,
    pub status: SubscriptionStatus,
    pub ip_policy: String,
    pub monthly_data_gb: i32,
    pub data_used_gb: f64,
    pub auto_top_up: bool,
    pub billing_cycle_start: Option<NaiveDate>,
    pub billing_cycle_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
}
