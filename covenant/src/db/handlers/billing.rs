//! Database repository for stored billing details.

use crate::types::{BillingInfoId, UserId, abbrev_uuid};
use crate::db::{
    errors::Result,
    handlers::repository::{Repository, push_pagination},
    models::billing::{BillingInfoCreateDBRequest, BillingInfoDBResponse, BillingInfoUpdateDBRequest},
};
use sqlx::{PgConnection, query_builder::QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const SELECT_WITH_USER: &str = r#"
    SELECT b.*, u.name AS user_name, u.email AS user_email
    FROM billing_info b
    LEFT JOIN users u ON u.id = b.user_id
"#;

/// Filter for listing billing details
#[derive(Debug, Clone, Default)]
pub struct BillingInfoFilter {
    pub user_id: Option<UserId>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl BillingInfoFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, ..Default::default() }
    }
}

pub struct BillingInfos<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BillingInfos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for BillingInfos<'c> {
    type CreateRequest = BillingInfoCreateDBRequest;
    type UpdateRequest = BillingInfoUpdateDBRequest;
    type Response = BillingInfoDBResponse;
    type Id = BillingInfoId;
    type Filter = BillingInfoFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let billing = sqlx::query_as::<_, BillingInfoDBResponse>(
            r#"
            INSERT INTO billing_info (
                id, user_id, cardholder_name, card_last_four, card_type, expiry_month, expiry_year,
                billing_cycle_day, available_credits, is_primary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.cardholder_name)
        .bind(&request.card_last_four)
        .bind(request.card_type)
        .bind(request.expiry_month)
        .bind(request.expiry_year)
        .bind(request.billing_cycle_day)
        .bind(request.available_credits)
        .bind(request.is_primary)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(billing)
    }

    #[instrument(skip(self), fields(billing_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let billing = sqlx::query_as::<_, BillingInfoDBResponse>(&format!("{SELECT_WITH_USER} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(billing)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_WITH_USER);
        query.push(" WHERE TRUE");
        if let Some(user_id) = filter.user_id {
            query.push(" AND b.user_id = ").push_bind(user_id);
        }
        query.push(" ORDER BY b.created_at DESC");
        push_pagination(&mut query, filter.skip, filter.limit);

        let billing = query
            .build_query_as::<BillingInfoDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(billing)
    }

    #[instrument(skip(self), fields(billing_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM billing_info WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(billing_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let billing = sqlx::query_as::<_, BillingInfoDBResponse>(
            r#"
            UPDATE billing_info SET
                cardholder_name = COALESCE($2, cardholder_name),
                card_last_four = COALESCE($3, card_last_four),
                card_type = COALESCE($4, card_type),
                expiry_month = COALESCE($5, expiry_month),
                expiry_year = COALESCE($6, expiry_year),
                billing_cycle_day = COALESCE($7, billing_cycle_day),
                available_credits = COALESCE($8, available_credits),
                is_primary = COALESCE($9, is_primary),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.cardholder_name)
        .bind(&request.card_last_four)
        .bind(request.card_type)
        .bind(request.expiry_month)
        .bind(request.expiry_year)
        .bind(request.billing_cycle_day)
        .bind(request.available_credits)
        .bind(request.is_primary)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(billing)
    }
}
