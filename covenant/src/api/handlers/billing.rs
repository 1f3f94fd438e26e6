use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::billing::{BillingInfoCreate, BillingInfoResponse, BillingInfoUpdate, ListBillingInfoQuery};
use crate::api::models::responses::{ErrorResponse, MessageResponse};
use crate::db::handlers::billing::BillingInfoFilter;
use crate::db::models::billing::{BillingInfoCreateDBRequest, BillingInfoUpdateDBRequest};
use crate::errors::{Error, Result, not_found_as};
use crate::types::BillingInfoId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/billing-info",
    tag = "billing",
    summary = "List billing details",
    responses(
        (status = 200, description = "Billing details, newest first", body = Vec<BillingInfoResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(ListBillingInfoQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_billing_info(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListBillingInfoQuery>,
) -> Result<Json<Vec<BillingInfoResponse>>> {
    let filter = BillingInfoFilter {
        user_id: query.user_id,
        ..BillingInfoFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let records = state.store.list_billing_info(&filter).await?;

    Ok(Json(records.into_iter().map(BillingInfoResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/billing-info",
    tag = "billing",
    summary = "Create billing details",
    request_body = BillingInfoCreate,
    responses(
        (status = 201, description = "Billing details stored", body = BillingInfoResponse),
        (status = 400, description = "Invalid request or unknown user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_billing_info(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<BillingInfoCreate>,
) -> Result<(StatusCode, Json<BillingInfoResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let record = state
        .store
        .create_billing_info(&BillingInfoCreateDBRequest::from(create))
        .await?;
    Ok((StatusCode::CREATED, Json(BillingInfoResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/billing-info/{billing_info_id}",
    tag = "billing",
    summary = "Get billing details",
    responses(
        (status = 200, description = "Billing details", body = BillingInfoResponse),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Billing details not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("billing_info_id" = uuid::Uuid, Path, description = "Billing info ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_billing_info(
    State(state): State<AppState>,
    ApiPath(billing_info_id): ApiPath<BillingInfoId>,
) -> Result<Json<BillingInfoResponse>> {
    let record = state
        .store
        .get_billing_info(billing_info_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Billing info".to_string(),
            id: billing_info_id.to_string(),
        })?;

    Ok(Json(BillingInfoResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/billing-info/{billing_info_id}",
    tag = "billing",
    summary = "Update billing details",
    request_body = BillingInfoUpdate,
    responses(
        (status = 200, description = "Billing details updated", body = BillingInfoResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Billing details not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("billing_info_id" = uuid::Uuid, Path, description = "Billing info ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_billing_info(
    State(state): State<AppState>,
    ApiPath(billing_info_id): ApiPath<BillingInfoId>,
    ApiJson(update): ApiJson<BillingInfoUpdate>,
) -> Result<Json<BillingInfoResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;

    let record = state
        .store
        .update_billing_info(billing_info_id, &BillingInfoUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Billing info", billing_info_id))?;

    Ok(Json(BillingInfoResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/billing-info/{billing_info_id}",
    tag = "billing",
    summary = "Delete billing details",
    responses(
        (status = 200, description = "Billing details deleted", body = MessageResponse),
        (status = 404, description = "Billing details not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("billing_info_id" = uuid::Uuid, Path, description = "Billing info ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_billing_info(
    State(state): State<AppState>,
    ApiPath(billing_info_id): ApiPath<BillingInfoId>,
) -> Result<Json<MessageResponse>> {
    if state.store.delete_billing_info(billing_info_id).await? {
        Ok(Json(MessageResponse::deleted("Billing info")))
    } else {
        Err(Error::NotFound {
            resource: "Billing info".to_string(),
            id: billing_info_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::billing::{BillingInfoResponse, CardType};
    use crate::test_utils::{create_test_app, create_test_user};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_create_defaults() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "card@example.com").await;

        let response = server
            .post("/api/billing-info")
            .json(&json!({
                "user_id": user.id,
                "cardholder_name": "Card Holder",
                "card_last_four": "4242",
                "card_type": "visa",
                "expiry_month": 12,
                "expiry_year": 2030
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let record = response.json::<BillingInfoResponse>();
        assert_eq!(record.billing_cycle_day, 1);
        assert_eq!(record.available_credits, Decimal::ZERO);
        assert!(!record.is_primary);
        assert_eq!(record.card_type, Some(CardType::Visa));
    }

    #[tokio::test]
    async fn test_invalid_card_details_are_rejected() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "bad@example.com").await;

        for body in [
            json!({"user_id": user.id, "card_last_four": "42"}),
            json!({"user_id": user.id, "expiry_month": 13}),
            json!({"user_id": user.id, "billing_cycle_day": 31}),
        ] {
            let response = server.post("/api/billing-info").json(&body).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert!(response.json::<Value>()["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_update_and_list_by_user() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "list@example.com").await;
        let record = server
            .post("/api/billing-info")
            .json(&json!({"user_id": user.id, "card_last_four": "1111"}))
            .await
            .json::<BillingInfoResponse>();

        let response = server
            .put(&format!("/api/billing-info/{}", record.id))
            .json(&json!({"is_primary": true, "available_credits": "25.00"}))
            .await;
        response.assert_status_ok();
        let updated = response.json::<BillingInfoResponse>();
        assert!(updated.is_primary);
        assert_eq!(updated.available_credits, Decimal::new(2500, 2));
        assert_eq!(updated.card_last_four.as_deref(), Some("1111"));

        let listed = server
            .get("/api/billing-info")
            .add_query_param("user_id", user.id)
            .await
            .json::<Vec<BillingInfoResponse>>();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_email.as_deref(), Some("list@example.com"));
    }

    #[tokio::test]
    async fn test_deleting_user_removes_billing_info() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "gone@example.com").await;
        let record = server
            .post("/api/billing-info")
            .json(&json!({"user_id": user.id}))
            .await
            .json::<BillingInfoResponse>();

        server.delete(&format!("/api/users/{}", user.id)).await.assert_status_ok();
        server
            .get(&format!("/api/billing-info/{}", record.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "del@example.com").await;
        let record = server
            .post("/api/billing-info")
            .json(&json!({"user_id": user.id, "card_last_four": "9999"}))
            .await
            .json::<BillingInfoResponse>();

        let response = server.delete(&format!("/api/billing-info/{}", record.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Billing info deleted successfully");

        let response = server.delete(&format!("/api/billing-info/{}", record.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.json::<Value>()["error"].is_string());
    }
}
