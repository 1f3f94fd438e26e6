//! Database models for billing details.

use crate::api::models::billing::{BillingInfoCreate, BillingInfoUpdate, CardType};
use crate::types::{BillingInfoId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct BillingInfoCreateDBRequest {
    pub user_id: UserId,
    pub cardholder_name: Option<String>,
    pub card_last_four: Option<String>,
    pub card_type: Option<CardType>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub billing_cycle_day: i32,
    pub available_credits: Decimal,
    pub is_primary: bool,
}

impl From<BillingInfoCreate> for BillingInfoCreateDBRequest {
    fn from(api: BillingInfoCreate) -> Self {
        Self {
            user_id: api.user_id,
            cardholder_name: api.cardholder_name,
            card_last_four: api.card_last_four,
            card_type: api.card_type,
            expiry_month: api.expiry_month,
            expiry_year: api.expiry_year,
            billing_cycle_day: api.billing_cycle_day.unwrap_or(1),
            available_credits: api.available_credits.unwrap_or(Decimal::ZERO),
            is_primary: api.is_primary.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BillingInfoUpdateDBRequest {
    pub cardholder_name: Option<String>,
    pub card_last_four: Option<String>,
    pub card_type: Option<CardType>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub billing_cycle_day: Option<i32>,
    pub available_credits: Option<Decimal>,
    pub is_primary: Option<bool>,
}

impl From<BillingInfoUpdate> for BillingInfoUpdateDBRequest {
    fn from(api: BillingInfoUpdate) -> Self {
        Self {
            cardholder_name: api.cardholder_name,
            card_last_four: api.card_last_four,
            card_type: api.card_type,
            expiry_month: api.expiry_month,
            expiry_year: api.expiry_year,
            billing_cycle_day: api.billing_cycle_day,
            available_credits: api.available_credits,
            is_primary: api.is_primary,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BillingInfoDBResponse {
    pub id: BillingInfoId,
    pub user_id: UserId,
    pub cardholder_name: Option<String>,
    pub card_last_four: Option<String>,
    pub card_type: Option<CardType>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub billing_cycle_day: i32,
    pub available_credits: Decimal,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
}
