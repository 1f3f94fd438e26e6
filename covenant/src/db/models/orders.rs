//! Database models for orders.

use crate::api::models::orders::{OrderCreate, OrderItem, OrderStatus, OrderUpdate};
use crate::types::{OrderId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, types::Json};

/// Database request for creating an order, with defaults already applied
#[derive(Debug, Clone)]
pub struct OrderCreateDBRequest {
    pub user_id: UserId,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub items: Vec<OrderItem>,
}

impl From<OrderCreate> for OrderCreateDBRequest {
    fn from(api: OrderCreate) -> Self {
        Self {
            user_id: api.user_id,
            order_number: api.order_number,
            order_date: api.order_date.unwrap_or_else(Utc::now),
            status: api.status.unwrap_or_default(),
            item_name: api.item_name,
            item_description: api.item_description,
            tracking_number: api.tracking_number,
            tracking_url: api.tracking_url,
            estimated_delivery: api.estimated_delivery,
            total_amount: api.total_amount,
            subtotal: api.subtotal,
            tax: api.tax,
            shipping_cost: api.shipping_cost,
            shipping_address: api.shipping_address,
            items: api.items,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderUpdateDBRequest {
    pub order_number: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub items: Option<Vec<OrderItem>>,
}

impl From<OrderUpdate> for OrderUpdateDBRequest {
    fn from(api: OrderUpdate) -> Self {
        Self {
            order_number: api.order_number,
            order_date: api.order_date,
            status: api.status,
            item_name: api.item_name,
            item_description: api.item_description,
            tracking_number: api.tracking_number,
            tracking_url: api.tracking_url,
            estimated_delivery: api.estimated_delivery,
            total_amount: api.total_amount,
            subtotal: api.subtotal,
            tax: api.tax,
            shipping_cost: api.shipping_cost,
            shipping_address: api.shipping_address,
            items: api.items,
        }
    }
}

/// Database response for an order. Line items live in a JSONB column.
#[derive(Debug, Clone, FromRow)]
pub struct OrderDBResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub items: Json<Vec<OrderItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
}
