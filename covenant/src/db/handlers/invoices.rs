//! Database repository for invoices.

use crate::types::{InvoiceId, SubscriptionId, UserId, abbrev_uuid};
use crate::{
    api::models::invoices::InvoiceStatus,
    db::{
        errors::Result,
        handlers::repository::{Repository, push_pagination},
        models::invoices::{InvoiceCreateDBRequest, InvoiceDBResponse, InvoiceUpdateDBRequest},
    },
};
use sqlx::{PgConnection, query_builder::QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const SELECT_WITH_JOINS: &str = r#"
    SELECT i.*, u.name AS user_name, u.email AS user_email, s.nickname AS subscription_name
    FROM invoices i
    LEFT JOIN users u ON u.id = i.user_id
    LEFT JOIN subscriptions s ON s.id = i.subscription_id
"#;

/// Filter for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub user_id: Option<UserId>,
    pub subscription_id: Option<SubscriptionId>,
    pub status: Option<InvoiceStatus>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl InvoiceFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, ..Default::default() }
    }
}

pub struct Invoices<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Invoices<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Invoices<'c> {
    type CreateRequest = InvoiceCreateDBRequest;
    type UpdateRequest = InvoiceUpdateDBRequest;
    type Response = InvoiceDBResponse;
    type Id = InvoiceId;
    type Filter = InvoiceFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), number = %request.invoice_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let invoice = sqlx::query_as::<_, InvoiceDBResponse>(
            r#"
            INSERT INTO invoices (
                id, user_id, subscription_id, invoice_number, invoice_date, due_date, description,
                payment_method, total_amount, balance_due, status, pdf_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.subscription_id)
        .bind(&request.invoice_number)
        .bind(request.invoice_date)
        .bind(request.due_date)
        .bind(&request.description)
        .bind(&request.payment_method)
        .bind(request.total_amount)
        .bind(request.balance_due)
        .bind(request.status)
        .bind(&request.pdf_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let invoice = sqlx::query_as::<_, InvoiceDBResponse>(&format!("{SELECT_WITH_JOINS} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(invoice)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_WITH_JOINS);
        query.push(" WHERE TRUE");
        if let Some(user_id) = filter.user_id {
            query.push(" AND i.user_id = ").push_bind(user_id);
        }
        if let Some(subscription_id) = filter.subscription_id {
            query.push(" AND i.subscription_id = ").push_bind(subscription_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND i.status = ").push_bind(status);
        }
        query.push(" ORDER BY i.invoice_date DESC, i.created_at DESC");
        push_pagination(&mut query, filter.skip, filter.limit);

        let invoices = query.build_query_as::<InvoiceDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(invoices)
    }

    #[instrument(skip(self), fields(invoice_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(invoice_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let invoice = sqlx::query_as::<_, InvoiceDBResponse>(
            r#"
            UPDATE invoices SET
                subscription_id = COALESCE($2, subscription_id),
                invoice_number = COALESCE($3, invoice_number),
                invoice_date = COALESCE($4, invoice_date),
                due_date = COALESCE($5, due_date),
                description = COALESCE($6, description),
                payment_method = COALESCE($7, payment_method),
                total_amount = COALESCE($8, total_amount),
                balance_due = COALESCE($9, balance_due),
                status = COALESCE($10, status),
                pdf_url = COALESCE($11, pdf_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.subscription_id)
        .bind(&request.invoice_number)
        .bind(request.invoice_date)
        .bind(request.due_date)
        .bind(&request.description)
        .bind(&request.payment_method)
        .bind(request.total_amount)
        .bind(request.balance_due)
        .bind(request.status)
        .bind(&request.pdf_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(invoice)
    }
}
