//! Database repository for subscriptions.

use crate::types::{SubscriptionId, UserId, abbrev_uuid};
use crate::{
    api::models::subscriptions::SubscriptionStatus,
    db::{
        errors::Result,
        handlers::repository::{Repository, push_pagination},
        models::subscriptions::{SubscriptionCreateDBRequest, SubscriptionDBResponse, SubscriptionUpdateDBRequest},
    },
};
use sqlx::{PgConnection, query_builder::QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const SELECT_WITH_USER: &str = r#"
    SELECT s.*, u.name AS user_name, u.email AS user_email
    FROM subscriptions s
    LEFT JOIN users u ON u.id = s.user_id
"#;

/// Filter for listing subscriptions
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub user_id: Option<UserId>,
    pub status: Option<SubscriptionStatus>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl SubscriptionFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, ..Default::default() }
    }
}

pub struct Subscriptions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Subscriptions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Subscriptions<'c> {
    type CreateRequest = SubscriptionCreateDBRequest;
    type UpdateRequest = SubscriptionUpdateDBRequest;
    type Response = SubscriptionDBResponse;
    type Id = SubscriptionId;
    type Filter = SubscriptionFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), number = %request.subscription_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(
            r#"
            INSERT INTO subscriptions (
                id, user_id, subscription_number, nickname, service_location, service_plan, status,
                ip_policy, monthly_data_gb, data_used_gb, auto_top_up, billing_cycle_start, billing_cycle_end
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.subscription_number)
        .bind(&request.nickname)
        .bind(&request.service_location)
        .bind(&request.service_plan)
        .bind(request.status)
        .bind(&request.ip_policy)
        .bind(request.monthly_data_gb)
        .bind(request.data_used_gb)
        .bind(request.auto_top_up)
        .bind(request.billing_cycle_start)
        .bind(request.billing_cycle_end)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscription)
    }

    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(&format!("{SELECT_WITH_USER} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(subscription)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_WITH_USER);
        query.push(" WHERE TRUE");
        if let Some(user_id) = filter.user_id {
            query.push(" AND s.user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND s.status = ").push_bind(status);
        }
        query.push(" ORDER BY s.created_at DESC");
        push_pagination(&mut query, filter.skip, filter.limit);

        let subscriptions = query
            .build_query_as::<SubscriptionDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;
        Ok(subscriptions)
    }

    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(subscription_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(
            r#"
            UPDATE subscriptions SET
                user_id = COALESCE($2, user_id),
                subscription_number = COALESCE($3, subscription_number),
                nickname = COALESCE($4, nickname),
                service_location = COALESCE($5, service_location),
                service_plan = COALESCE($6, service_plan),
                status = COALESCE($7, status),
                ip_policy = COALESCE($8, ip_policy),
                monthly_data_gb = COALESCE($9, monthly_data_gb),
                data_used_gb = COALESCE($10, data_used_gb),
                auto_top_up = COALESCE($11, auto_top_up),
                billing_cycle_start = COALESCE($12, billing_cycle_start),
                billing_cycle_end = COALESCE($13, billing_cycle_end),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.user_id)
        .bind(&request.subscription_number)
        .bind(&request.nickname)
        .bind(&request.service_location)
        .bind(&request.service_plan)
        .bind(request.status)
        .bind(&request.ip_policy)
        .bind(request.monthly_data_gb)
        .bind(request.data_used_gb)
        .bind(request.auto_top_up)
        .bind(request.billing_cycle_start)
        .bind(request.billing_cycle_end)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscription)
    }
}
