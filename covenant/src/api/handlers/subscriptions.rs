use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::responses::{ErrorResponse, MessageResponse};
use crate::api::models::subscriptions::{
    ListSubscriptionsQuery, SubscriptionCreate, SubscriptionResponse, SubscriptionUpdate,
};
use crate::db::handlers::subscriptions::SubscriptionFilter;
use crate::db::models::subscriptions::{SubscriptionCreateDBRequest, SubscriptionUpdateDBRequest};
use crate::errors::{Error, Result, not_found_as};
use crate::types::SubscriptionId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "subscriptions",
    summary = "List subscriptions",
    responses(
        (status = 200, description = "Subscriptions, newest first", body = Vec<SubscriptionResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(ListSubscriptionsQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListSubscriptionsQuery>,
) -> Result<Json<Vec<SubscriptionResponse>>> {
    let filter = SubscriptionFilter {
        user_id: query.user_id,
        status: query.status,
        ..SubscriptionFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let subscriptions = state.store.list_subscriptions(&filter).await?;

    Ok(Json(subscriptions.into_iter().map(SubscriptionResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "subscriptions",
    summary = "Create subscription",
    description = "Unset fields default to an active subscription with a 350 GB monthly allowance and the `default` IP policy.",
    request_body = SubscriptionCreate,
    responses(
        (status = 201, description = "Subscription created successfully", body = SubscriptionResponse),
        (status = 400, description = "Invalid request or unknown user", body = ErrorResponse),
        (status = 409, description = "Subscription number already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_subscription(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<SubscriptionCreate>,
) -> Result<(StatusCode, Json<SubscriptionResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let subscription = state
        .store
        .create_subscription(&SubscriptionCreateDBRequest::from(create))
        .await?;
    Ok((StatusCode::CREATED, Json(SubscriptionResponse::from(subscription))))
}

#[utoipa::path(
    get,
    path = "/subscriptions/{subscription_id}",
    tag = "subscriptions",
    summary = "Get subscription",
    responses(
        (status = 200, description = "Subscription details", body = SubscriptionResponse),
        (status = 400, description = "Malformed subscription ID", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("subscription_id" = uuid::Uuid, Path, description = "Subscription ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_subscription(
    State(state): State<AppState>,
    ApiPath(subscription_id): ApiPath<SubscriptionId>,
) -> Result<Json<SubscriptionResponse>> {
    let subscription = state
        .store
        .get_subscription(subscription_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Subscription".to_string(),
            id: subscription_id.to_string(),
        })?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

#[utoipa::path(
    put,
    path = "/subscriptions/{subscription_id}",
    tag = "subscriptions",
    summary = "Update subscription",
    request_body = SubscriptionUpdate,
    responses(
        (status = 200, description = "Subscription updated successfully", body = SubscriptionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 409, description = "Subscription number already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("subscription_id" = uuid::Uuid, Path, description = "Subscription ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_subscription(
    State(state): State<AppState>,
    ApiPath(subscription_id): ApiPath<SubscriptionId>,
    ApiJson(update): ApiJson<SubscriptionUpdate>,
) -> Result<Json<SubscriptionResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;

    let subscription = state
        .store
        .update_subscription(subscription_id, &SubscriptionUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Subscription", subscription_id))?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

#[utoipa::path(
    delete,
    path = "/subscriptions/{subscription_id}",
    tag = "subscriptions",
    summary = "Delete subscription",
    description = "Invoices and devices attached to the subscription are kept and detached from it.",
    responses(
        (status = 200, description = "Subscription deleted successfully", body = MessageResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("subscription_id" = uuid::Uuid, Path, description = "Subscription ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    ApiPath(subscription_id): ApiPath<SubscriptionId>,
) -> Result<Json<MessageResponse>> {
    if state.store.delete_subscription(subscription_id).await? {
        Ok(Json(MessageResponse::deleted("Subscription")))
    } else {
        Err(Error::NotFound {
            resource: "Subscription".to_string(),
            id: subscription_id.to_string(),
        })
    }
}
