//! Database repository for hardware orders.

use crate::types::{OrderId, UserId, abbrev_uuid};
use crate::{
    api::models::orders::OrderStatus,
    db::{
        errors::Result,
        handlers::repository::{Repository, push_pagination},
        models::orders::{OrderCreateDBRequest, OrderDBResponse, OrderUpdateDBRequest},
    },
};
use sqlx::{PgConnection, query_builder::QueryBuilder, types::Json};
use tracing::instrument;
use uuid::Uuid;

const SELECT_WITH_USER: &str = r#"
    SELECT o.*, u.name AS user_name, u.email AS user_email
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
"#;

/// Filter for listing orders
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl OrderFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, ..Default::default() }
    }
}

pub struct Orders<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Orders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Orders<'c> {
    type CreateRequest = OrderCreateDBRequest;
    type UpdateRequest = OrderUpdateDBRequest;
    type Response = OrderDBResponse;
    type Id = OrderId;
    type Filter = OrderFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), number = %request.order_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            INSERT INTO orders (
                id, user_id, order_number, order_date, status, item_name, item_description,
                tracking_number, tracking_url, estimated_delivery, total_amount, subtotal, tax,
                shipping_cost, shipping_address, items
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.order_number)
        .bind(request.order_date)
        .bind(request.status)
        .bind(&request.item_name)
        .bind(&request.item_description)
        .bind(&request.tracking_number)
        .bind(&request.tracking_url)
        .bind(request.estimated_delivery)
        .bind(request.total_amount)
        .bind(request.subtotal)
        .bind(request.tax)
        .bind(request.shipping_cost)
        .bind(&request.shipping_address)
        .bind(Json(&request.items))
        .fetch_one(&mut *self.db)
        .await?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let order = sqlx::query_as::<_, OrderDBResponse>(&format!("{SELECT_WITH_USER} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(order)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_WITH_USER);
        query.push(" WHERE TRUE");
        if let Some(user_id) = filter.user_id {
            query.push(" AND o.user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND o.status = ").push_bind(status);
        }
        query.push(" ORDER BY o.order_date DESC");
        push_pagination(&mut query, filter.skip, filter.limit);

        let orders = query.build_query_as::<OrderDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(orders)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let order = sqlx::query_as::<_, OrderDBResponse>(
            r#"
            UPDATE orders SET
                order_number = COALESCE($2, order_number),
                order_date = COALESCE($3, order_date),
                status = COALESCE($4, status),
                item_name = COALESCE($5, item_name),
                item_description = COALESCE($6, item_description),
                tracking_number = COALESCE($7, tracking_number),
                tracking_url = COALESCE($8, tracking_url),
                estimated_delivery = COALESCE($9, estimated_delivery),
                total_amount = COALESCE($10, total_amount),
                subtotal = COALESCE($11, subtotal),
                tax = COALESCE($12, tax),
                shipping_cost = COALESCE($13, shipping_cost),
                shipping_address = COALESCE($14, shipping_address),
                items = COALESCE($15, items),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.order_number)
        .bind(request.order_date)
        .bind(request.status)
        .bind(&request.item_name)
        .bind(&request.item_description)
        .bind(&request.tracking_number)
        .bind(&request.tracking_url)
        .bind(request.estimated_delivery)
        .bind(request.total_amount)
        .bind(request.subtotal)
        .bind(request.tax)
        .bind(request.shipping_cost)
        .bind(&request.shipping_address)
        .bind(request.items.as_ref().map(Json))
        .fetch_one(&mut *self.db)
        .await?;

        Ok(order)
    }
}
