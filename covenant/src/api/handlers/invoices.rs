use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::invoices::{InvoiceCreate, InvoiceResponse, InvoiceUpdate, ListInvoicesQuery};
use crate::api::models::responses::{ErrorResponse, MessageResponse};
use crate::db::handlers::invoices::InvoiceFilter;
use crate::db::models::invoices::{InvoiceCreateDBRequest, InvoiceUpdateDBRequest};
use crate::errors::{Error, Result, not_found_as};
use crate::types::InvoiceId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/invoices",
    tag = "invoices",
    summary = "List invoices",
    responses(
        (status = 200, description = "Invoices, most recent invoice date first", body = Vec<InvoiceResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(ListInvoicesQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceResponse>>> {
    let filter = InvoiceFilter {
        user_id: query.user_id,
        subscription_id: query.subscription_id,
        status: query.status,
        ..InvoiceFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let invoices = state.store.list_invoices(&filter).await?;

    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/invoices",
    tag = "invoices",
    summary = "Create invoice",
    request_body = InvoiceCreate,
    responses(
        (status = 201, description = "Invoice created successfully", body = InvoiceResponse),
        (status = 400, description = "Invalid request or unknown user/subscription", body = ErrorResponse),
        (status = 409, description = "Invoice number already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_invoice(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<InvoiceCreate>,
) -> Result<(StatusCode, Json<InvoiceResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let invoice = state.store.create_invoice(&InvoiceCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(invoice))))
}

#[utoipa::path(
    get,
    path = "/invoices/{invoice_id}",
    tag = "invoices",
    summary = "Get invoice",
    responses(
        (status = 200, description = "Invoice details", body = InvoiceResponse),
        (status = 400, description = "Malformed invoice ID", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("invoice_id" = uuid::Uuid, Path, description = "Invoice ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_invoice(
    State(state): State<AppState>,
    ApiPath(invoice_id): ApiPath<InvoiceId>,
) -> Result<Json<InvoiceResponse>> {
    let invoice = state.store.get_invoice(invoice_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Invoice".to_string(),
        id: invoice_id.to_string(),
    })?;

    Ok(Json(InvoiceResponse::from(invoice)))
}

#[utoipa::path(
    put,
    path = "/invoices/{invoice_id}",
    tag = "invoices",
    summary = "Update invoice",
    request_body = InvoiceUpdate,
    responses(
        (status = 200, description = "Invoice updated successfully", body = InvoiceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 409, description = "Invoice number already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("invoice_id" = uuid::Uuid, Path, description = "Invoice ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_invoice(
    State(state): State<AppState>,
    ApiPath(invoice_id): ApiPath<InvoiceId>,
    ApiJson(update): ApiJson<InvoiceUpdate>,
) -> Result<Json<InvoiceResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;

    if update.changes_dates() {
        let current = state.store.get_invoice(invoice_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Invoice".to_string(),
            id: invoice_id.to_string(),
        })?;
        update
            .validate_merged_dates(current.invoice_date, current.due_date)
            .map_err(|message| Error::BadRequest { message })?;
    }

    let invoice = state
        .store
        .update_invoice(invoice_id, &InvoiceUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Invoice", invoice_id))?;

    Ok(Json(InvoiceResponse::from(invoice)))
}

#[utoipa::path(
    delete,
    path = "/invoices/{invoice_id}",
    tag = "invoices",
    summary = "Delete invoice",
    responses(
        (status = 200, description = "Invoice deleted successfully", body = MessageResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("invoice_id" = uuid::Uuid, Path, description = "Invoice ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    ApiPath(invoice_id): ApiPath<InvoiceId>,
) -> Result<Json<MessageResponse>> {
    if state.store.delete_invoice(invoice_id).await? {
        Ok(Json(MessageResponse::deleted("Invoice")))
    } else {
        Err(Error::NotFound {
            resource: "Invoice".to_string(),
            id: invoice_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::invoices::{InvoiceResponse, InvoiceStatus};
    use crate::api::models::subscriptions::SubscriptionResponse;
    use crate::test_utils::{create_test_app, create_test_user};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_create_defaults_and_subscription_name() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "billing@example.com").await;
        let subscription = server
            .post("/api/subscriptions")
            .json(&json!({"user_id": user.id, "subscription_number": "SUB-9", "nickname": "Farm"}))
            .await
            .json::<SubscriptionResponse>();

        let response = server
            .post("/api/invoices")
            .json(&json!({
                "user_id": user.id,
                "subscription_id": subscription.id,
                "invoice_number": "INV-001",
                "invoice_date": "2024-03-01",
                "due_date": "2024-03-15",
                "total_amount": "120.00"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let invoice = response.json::<InvoiceResponse>();
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(invoice.balance_due, Decimal::ZERO);

        let fetched = server
            .get(&format!("/api/invoices/{}", invoice.id))
            .await
            .json::<InvoiceResponse>();
        assert_eq!(fetched.subscription_name.as_deref(), Some("Farm"));
        assert_eq!(fetched.user_email.as_deref(), Some("billing@example.com"));
    }

    #[tokio::test]
    async fn test_due_date_before_invoice_date_is_rejected() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "dates@example.com").await;

        let response = server
            .post("/api/invoices")
            .json(&json!({
                "user_id": user.id,
                "invoice_number": "INV-002",
                "invoice_date": "2024-03-15",
                "due_date": "2024-03-01",
                "total_amount": "10.00"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_cannot_move_due_date_before_invoice_date() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "redate@example.com").await;
        let invoice = server
            .post("/api/invoices")
            .json(&json!({
                "user_id": user.id,
                "invoice_number": "INV-006",
                "invoice_date": "2024-03-01",
                "due_date": "2024-03-15",
                "total_amount": "10.00"
            }))
            .await
            .json::<InvoiceResponse>();

        server
            .put(&format!("/api/invoices/{}", invoice.id))
            .json(&json!({"due_date": "2024-02-20"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .put(&format!("/api/invoices/{}", invoice.id))
            .json(&json!({"invoice_date": "2024-04-01"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&format!("/api/invoices/{}", invoice.id))
            .json(&json!({"invoice_date": "2024-03-10", "due_date": "2024-03-20"}))
            .await;
        response.assert_status_ok();
        let updated = response.json::<InvoiceResponse>();
        assert_eq!(updated.due_date.to_string(), "2024-03-20");

        let stored = server
            .get(&format!("/api/invoices/{}", invoice.id))
            .await
            .json::<InvoiceResponse>();
        assert_eq!(stored.invoice_date.to_string(), "2024-03-10");
    }

    #[tokio::test]
    async fn test_mark_paid() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "pay@example.com").await;
        let invoice = server
            .post("/api/invoices")
            .json(&json!({
                "user_id": user.id,
                "invoice_number": "INV-003",
                "invoice_date": "2024-03-01",
                "due_date": "2024-03-15",
                "total_amount": "120.00",
                "balance_due": "120.00"
            }))
            .await
            .json::<InvoiceResponse>();

        let response = server
            .put(&format!("/api/invoices/{}", invoice.id))
            .json(&json!({"status": "paid", "balance_due": "0"}))
            .await;
        response.assert_status_ok();
        let updated = response.json::<InvoiceResponse>();
        assert_eq!(updated.status, InvoiceStatus::Paid);
        assert_eq!(updated.balance_due, Decimal::ZERO);
        assert_eq!(updated.total_amount, Decimal::new(12000, 2));
        assert_eq!(updated.invoice_number, "INV-003");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400_with_error_shape() {
        let server = create_test_app().await;
        let response = server
            .post("/api/invoices")
            .json(&json!({"invoice_number": "INV-004"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn test_delete() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "del@example.com").await;
        let invoice = server
            .post("/api/invoices")
            .json(&json!({
                "user_id": user.id,
                "invoice_number": "INV-005",
                "invoice_date": "2024-03-01",
                "due_date": "2024-03-01",
                "total_amount": "1.00"
            }))
            .await
            .json::<InvoiceResponse>();

        let response = server.delete(&format!("/api/invoices/{}", invoice.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Invoice deleted successfully");
        server
            .delete(&format!("/api/invoices/{}", invoice.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
