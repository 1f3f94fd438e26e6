//! API request/response models for invoices.

use super::pagination::Pagination;
use crate::db::models::invoices::InvoiceDBResponse;
use crate::types::{InvoiceId, SubscriptionId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Unpaid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    /// Defaults to 0
    #[schema(value_type = Option<String>)]
    pub balance_due: Option<Decimal>,
    /// Defaults to `unpaid`
    pub status: Option<InvoiceStatus>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InvoiceUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub balance_due: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InvoiceId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Nickname of the billed subscription
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListInvoicesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return invoices issued to this user
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    /// Only return invoices for this subscription
    #[param(value_type = Option<String>, format = "uuid")]
    pub subscription_id: Option<SubscriptionId>,

    /// Only return invoices in this status
    pub status: Option<InvoiceStatus>,
}

fn check_dates(invoice_date: NaiveDate, due_date: NaiveDate) -> Result<(), String> {
    if due_date < invoice_date {
        return Err("due_date must not be before invoice_date".to_string());
    }
    Ok(())
}

impl InvoiceCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.invoice_number.trim().is_empty() {
            return Err("invoice_number must not be empty".to_string());
        }
        check_dates(self.invoice_date, self.due_date)?;
        if self.total_amount.is_sign_negative() || self.balance_due.is_some_and(|b| b.is_sign_negative()) {
            return Err("Invoice amounts must not be negative".to_string());
        }
        Ok(())
    }
}

impl InvoiceUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if [self.total_amount, self.balance_due].iter().flatten().any(|a| a.is_sign_negative()) {
            return Err("Invoice amounts must not be negative".to_string());
        }
        Ok(())
    }

    /// Whether the update touches either date, so the merged dates need re-checking.
    pub fn changes_dates(&self) -> bool {
        self.invoice_date.is_some() || self.due_date.is_some()
    }

    /// Check the date ordering against the stored invoice with this update applied.
    pub fn validate_merged_dates(&self, current_invoice_date: NaiveDate, current_due_date: NaiveDate) -> Result<(), String> {
        check_dates(
            self.invoice_date.unwrap_or(current_invoice_date),
            self.due_date.unwrap_or(current_due_date),
        )
    }
}

impl From<InvoiceDBResponse> for InvoiceResponse {
    fn from(db: InvoiceDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            subscription_id: db.subscription_id,
            invoice_number: db.invoice_number,
            invoice_date: db.invoice_date,
            due_date: db.due_date,
            description: db.description,
            payment_method: db.payment_method,
            total_amount: db.total_amount,
            balance_due: db.balance_due,
            status: db.status,
            pdf_url: db.pdf_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
            user_name: db.user_name,
            user_email: db.user_email,
            subscription_name: db.subscription_name,
        }
    }
}
