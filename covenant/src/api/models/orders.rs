//! API request/response models for hardware orders.

use super::pagination::Pagination;
use crate::db::models::orders::OrderDBResponse;
use crate::types::{OrderId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// A line item embedded in its order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub item_id: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub status: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub order_number: String,
    /// Defaults to now
    pub order_date: Option<DateTime<Utc>>,
    /// Defaults to `processing`
    pub status: Option<OrderStatus>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub subtotal: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub tax: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub shipping_cost: Option<Decimal>,
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OrderUpdate {
    pub order_number: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub subtotal: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub tax: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub shipping_cost: Option<Decimal>,
    pub shipping_address: Option<String>,
    /// Replaces the whole item list when present
    pub items: Option<Vec<OrderItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrderId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub subtotal: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub tax: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub shipping_cost: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return orders placed by this user
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    /// Only return orders in this status
    pub status: Option<OrderStatus>,
}

fn validate_amounts(amounts: &[Option<Decimal>], items: Option<&[OrderItem]>) -> Result<(), String> {
    if amounts.iter().flatten().any(|amount| amount.is_sign_negative()) {
        return Err("Order amounts must not be negative".to_string());
    }
    if items.is_some_and(|items| items.iter().any(|item| item.price.is_sign_negative())) {
        return Err("Item prices must not be negative".to_string());
    }
    Ok(())
}

impl OrderCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.order_number.trim().is_empty() {
            return Err("order_number must not be empty".to_string());
        }
        validate_amounts(
            &[self.total_amount, self.subtotal, self.tax, self.shipping_cost],
            Some(self.items.as_slice()),
        )
    }
}

impl OrderUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_amounts(
            &[self.total_amount, self.subtotal, self.tax, self.shipping_cost],
            self.items.as_deref(),
        )
    }
}

impl From<OrderDBResponse> for OrderResponse {
    fn from(db: OrderDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            order_number: db.order_number,
            order_date: db.order_date,
            status: db.status,
            item_name: db.item_name,
            item_description: db.item_description,
            tracking_number: db.tracking_number,
            tracking_url: db.tracking_url,
            estimated_delivery: db.estimated_delivery,
            total_amount: db.total_amount,
            subtotal: db.subtotal,
            tax: db.tax,
            shipping_cost: db.shipping_cost,
            shipping_address: db.shipping_address,
            items: db.items.0,
            created_at: db.created_at,
            updated_at: db.updated_at,
            user_name: db.user_name,
            user_email: db.user_email,
        }
    }
}
