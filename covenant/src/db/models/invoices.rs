//! Database models for invoices.

use crate::api::models::invoices::{InvoiceCreate, InvoiceStatus, InvoiceUpdate};
use crate::types::{InvoiceId, SubscriptionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct InvoiceCreateDBRequest {
    pub user_id: UserId,
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
    pub pdf_url: Option<String>,
}

impl From<InvoiceCreate> for InvoiceCreateDBRequest {
    fn from(api: InvoiceCreate) -> Self {
        Self {
            user_id: api.user_id,
            subscription_id: api.subscription_id,
            invoice_number: api.invoice_number,
            invoice_date: api.invoice_date,
            due_date: api.due_date,
            description: api.description,
            payment_method: api.payment_method,
            total_amount: api.total_amount,
            balance_due: api.balance_due.unwrap_or(Decimal::ZERO),
            status: api.status.unwrap_or_default(),
            pdf_url: api.pdf_url,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceUpdateDBRequest {
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub total_amount: Option<Decimal>,
    pub balance_due: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub pdf_url: Option<String>,
}

impl From<InvoiceUpdate> for InvoiceUpdateDBRequest {
    fn from(api: InvoiceUpdate) -> Self {
        Self {
            subscription_id: api.subscription_id,
            invoice_number: api.invoice_number,
            invoice_date: api.invoice_date,
            due_date: api.due_date,
            description: api.description,
            payment_method: api.payment_method,
            total_amount: api.total_amount,
            balance_due: api.balance_due,
            status: api.status,
            pdf_url: api.pdf_url,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceDBResponse {
    pub id: InvoiceId,
    pub user_id: UserId,
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
    #[sqlx(default)]
    pub subscription_name: Option<String>,
}
