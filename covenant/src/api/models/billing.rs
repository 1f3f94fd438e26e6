//! API request/response models for stored billing details.
//!
//! Only the last four digits of a card are ever stored.

use super::pagination::Pagination;
use crate::db::models::billing::BillingInfoDBResponse;
use crate::types::{BillingInfoId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "card_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingInfoCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub cardholder_name: Option<String>,
    pub card_last_four: Option<String>,
    pub card_type: Option<CardType>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    /// Day of month the billing cycle starts (1-28, defaults to 1)
    pub billing_cycle_day: Option<i32>,
    /// Defaults to 0
    #[schema(value_type = Option<String>)]
    pub available_credits: Option<Decimal>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BillingInfoUpdate {
    pub cardholder_name: Option<String>,
    pub card_last_four: Option<String>,
    pub card_type: Option<CardType>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub billing_cycle_day: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub available_credits: Option<Decimal>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingInfoResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BillingInfoId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub cardholder_name: Option<String>,
    pub card_last_four: Option<String>,
    pub card_type: Option<CardType>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
    pub billing_cycle_day: i32,
    #[schema(value_type = String)]
    pub available_credits: Decimal,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBillingInfoQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return billing details belonging to this user
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
}

fn validate_card(
    card_last_four: Option<&str>,
    expiry_month: Option<i32>,
    billing_cycle_day: Option<i32>,
    available_credits: Option<Decimal>,
) -> Result<(), String> {
    if card_last_four.is_some_and(|digits| digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit())) {
        return Err("card_last_four must be exactly four digits".to_string());
    }
    if expiry_month.is_some_and(|month| !(1..=12).contains(&month)) {
        return Err("expiry_month must be between 1 and 12".to_string());
    }
    if billing_cycle_day.is_some_and(|day| !(1..=28).contains(&day)) {
        return Err("billing_cycle_day must be between 1 and 28".to_string());
    }
    if available_credits.is_some_and(|credits| credits.is_sign_negative()) {
        return Err("available_credits must not be negative".to_string());
    }
    Ok(())
}

impl BillingInfoCreate {
    pub fn validate(&self) -> Result<(), String> {
        validate_card(
            self.card_last_four.as_deref(),
            self.expiry_month,
            self.billing_cycle_day,
            self.available_credits,
        )
    }
}

impl BillingInfoUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_card(
            self.card_last_four.as_deref(),
            self.expiry_month,
            self.billing_cycle_day,
            self.available_credits,
        )
    }
}

impl From<BillingInfoDBResponse> for BillingInfoResponse {
    fn from(db: BillingInfoDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            cardholder_name: db.cardholder_name,
            card_last_four: db.card_last_four,
            card_type: db.card_type,
            expiry_month: db.expiry_month,
            expiry_year: db.expiry_year,
            billing_cycle_day: db.billing_cycle_day,
            available_credits: db.available_credits,
            is_primary: db.is_primary,
            created_at: db.created_at,
            updated_at: db.updated_at,
            user_name: db.user_name,
            user_email: db.user_email,
        }
    }
}
