//! API request/response models for service subscriptions.

use super::pagination::Pagination;
use crate::db::models::subscriptions::SubscriptionDBResponse;
use crate::types::{SubscriptionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Monthly data allowance applied when a subscription is created without one
pub const DEFAULT_MONTHLY_DATA_GB: i32 = 350;

/// IP policy applied when a subscription is created without one
pub const DEFAULT_IP_POLICY: &str = "default";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub subscription_number: String,
    pub nickname: Option<String>,
    pub service_location: Option<String>,
    pub service_plan: Option<String>,
    /// Defaults to `active`
    pub status: Option<SubscriptionStatus>,
    /// Defaults to `default`
    pub ip_policy: Option<String>,
    /// Defaults to 350
    pub monthly_data_gb: Option<i32>,
    pub data_used_gb: Option<f64>,
    pub auto_top_up: Option<bool>,
    pub billing_cycle_start: Option<NaiveDate>,
    pub billing_cycle_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
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

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubscriptionId,
    #[schema(value_type = String, format = "uuid")]
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
    /// Owning user's name (list and get only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Owning user's email (list and get only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return subscriptions belonging to this user
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    /// Only return subscriptions in this status
    pub status: Option<SubscriptionStatus>,
}

fn validate_usage(monthly_data_gb: Option<i32>, data_used_gb: Option<f64>) -> Result<(), String> {
    if monthly_data_gb.is_some_and(|gb| gb < 0) {
        return Err("monthly_data_gb must not be negative".to_string());
    }
    if data_used_gb.is_some_and(|gb| gb < 0.0 || !gb.is_finite()) {
        return Err("data_used_gb must be a non-negative number".to_string());
    }
    Ok(())
}

impl SubscriptionCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.subscription_number.trim().is_empty() {
            return Err("subscription_number must not be empty".to_string());
        }
        validate_usage(self.monthly_data_gb, self.data_used_gb)
    }
}

impl SubscriptionUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_usage(self.monthly_data_gb, self.data_used_gb)
    }
}

impl From<SubscriptionDBResponse> for SubscriptionResponse {
    fn from(db: SubscriptionDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            subscription_number: db.subscription_number,
            nickname: db.nickname,
            service_location: db.service_location,
            service_plan: db.service_plan,
            status: db.status,
            ip_policy: db.ip_policy,
            monthly_data_gb: db.monthly_data_gb,
            data_used_gb: db.data_used_gb,
            auto_top_up: db.auto_top_up,
            billing_cycle_start: db.billing_cycle_start,
            billing_cycle_end: db.billing_cycle_end,
            created_at: db.created_at,
            updated_at: db.updated_at,
            user_name: db.user_name,
            user_email: db.user_email,
        }
    }
}
