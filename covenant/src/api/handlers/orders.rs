use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::orders::{ListOrdersQuery, OrderCreate, OrderResponse, OrderUpdate};
use crate::api::models::responses::{ErrorResponse, MessageResponse};
use crate::db::handlers::orders::OrderFilter;
use crate::db::models::orders::{OrderCreateDBRequest, OrderUpdateDBRequest};
use crate::errors::{Error, Result, not_found_as};
use crate::types::OrderId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    summary = "List orders",
    responses(
        (status = 200, description = "Orders, most recent order date first", body = Vec<OrderResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(ListOrdersQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>> {
    let filter = OrderFilter {
        user_id: query.user_id,
        status: query.status,
        ..OrderFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let orders = state.store.list_orders(&filter).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    summary = "Create order",
    request_body = OrderCreate,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Invalid request or unknown user", body = ErrorResponse),
        (status = 409, description = "Order number already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<OrderCreate>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let order = state.store.create_order(&OrderCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    tag = "orders",
    summary = "Get order",
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 400, description = "Malformed order ID", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("order_id" = uuid::Uuid, Path, description = "Order ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_order(State(state): State<AppState>, ApiPath(order_id): ApiPath<OrderId>) -> Result<Json<OrderResponse>> {
    let order = state.store.get_order(order_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Order".to_string(),
        id: order_id.to_string(),
    })?;

    Ok(Json(OrderResponse::from(order)))
}

#[utoipa::path(
    put,
    path = "/orders/{order_id}",
    tag = "orders",
    summary = "Update order",
    description = "Omitted fields keep their stored value. Sending `items` replaces the whole item list.",
    request_body = OrderUpdate,
    responses(
        (status = 200, description = "Order updated successfully", body = OrderResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Order number already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("order_id" = uuid::Uuid, Path, description = "Order ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_order(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(update): ApiJson<OrderUpdate>,
) -> Result<Json<OrderResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;

    let order = state
        .store
        .update_order(order_id, &OrderUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Order", order_id))?;

    Ok(Json(OrderResponse::from(order)))
}

#[utoipa::path(
    delete,
    path = "/orders/{order_id}",
    tag = "orders",
    summary = "Delete order",
    responses(
        (status = 200, description = "Order deleted successfully", body = MessageResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("order_id" = uuid::Uuid, Path, description = "Order ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_order(State(state): State<AppState>, ApiPath(order_id): ApiPath<OrderId>) -> Result<Json<MessageResponse>> {
    if state.store.delete_order(order_id).await? {
        Ok(Json(MessageResponse::deleted("Order")))
    } else {
        Err(Error::NotFound {
            resource: "Order".to_string(),
            id: order_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::orders::{OrderResponse, OrderStatus};
    use crate::test_utils::{create_test_app, create_test_user};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_with_items() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "buyer@example.com").await;

        let response = server
            .post("/api/orders")
            .json(&json!({
                "user_id": user.id,
                "order_number": "ORD-1",
                "total_amount": "599.00",
                "items": [
                    {"id": "1", "name": "Standard Kit", "item_id": "UTA-231", "price": "499.00", "status": "shipped", "image_url": null},
                    {"id": "2", "name": "Pipe Adapter", "item_id": null, "price": 100, "status": "processing", "image_url": null}
                ]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let order = response.json::<OrderResponse>();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].price, Decimal::new(49900, 2));
        assert_eq!(order.total_amount, Some(Decimal::new(59900, 2)));
    }

    #[tokio::test]
    async fn test_items_default_to_empty() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "empty@example.com").await;

        let order = server
            .post("/api/orders")
            .json(&json!({"user_id": user.id, "order_number": "ORD-2"}))
            .await
            .json::<OrderResponse>();
        assert!(order.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_order_date() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "dates@example.com").await;
        for (number, date) in [
            ("ORD-OLD", "2024-01-05T10:00:00Z"),
            ("ORD-NEW", "2024-03-05T10:00:00Z"),
            ("ORD-MID", "2024-02-05T10:00:00Z"),
        ] {
            server
                .post("/api/orders")
                .json(&json!({"user_id": user.id, "order_number": number, "order_date": date}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let numbers: Vec<String> = server
            .get("/api/orders")
            .await
            .json::<Vec<OrderResponse>>()
            .into_iter()
            .map(|o| o.order_number)
            .collect();
        assert_eq!(numbers, vec!["ORD-NEW", "ORD-MID", "ORD-OLD"]);
    }

    #[tokio::test]
    async fn test_update_tracking_keeps_items() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "track@example.com").await;
        let order = server
            .post("/api/orders")
            .json(&json!({
                "user_id": user.id,
                "order_number": "ORD-3",
                "items": [{"id": "1", "name": "Router", "item_id": null, "price": "199.00", "status": "processing", "image_url": null}]
            }))
            .await
            .json::<OrderResponse>();

        let response = server
            .put(&format!("/api/orders/{}", order.id))
            .json(&json!({"status": "shipped", "tracking_number": "1Z999"}))
            .await;
        response.assert_status_ok();
        let updated = response.json::<OrderResponse>();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.tracking_number.as_deref(), Some("1Z999"));
        assert_eq!(updated.items, order.items);
    }

    #[tokio::test]
    async fn test_negative_amount_is_rejected() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "neg@example.com").await;

        server
            .post("/api/orders")
            .json(&json!({"user_id": user.id, "order_number": "ORD-4", "tax": "-1.00"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_missing_order_is_404() {
        let server = create_test_app().await;
        server
            .delete(&format!("/api/orders/{}", uuid::Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
