use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::devices::{DeviceCreate, DeviceResponse, DeviceUpdate, ListDevicesQuery};
use crate::api::models::responses::{ErrorResponse, MessageResponse};
use crate::db::handlers::devices::DeviceFilter;
use crate::db::models::devices::{DeviceCreateDBRequest, DeviceUpdateDBRequest};
use crate::errors::{Error, Result, not_found_as};
use crate::types::DeviceId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/devices",
    tag = "devices",
    summary = "List devices",
    responses(
        (status = 200, description = "Devices, newest first", body = Vec<DeviceResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(ListDevicesQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_devices(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListDevicesQuery>,
) -> Result<Json<Vec<DeviceResponse>>> {
    let filter = DeviceFilter {
        user_id: query.user_id,
        subscription_id: query.subscription_id,
        status: query.status,
        ..DeviceFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let devices = state.store.list_devices(&filter).await?;

    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/devices",
    tag = "devices",
    summary = "Register device",
    request_body = DeviceCreate,
    responses(
        (status = 201, description = "Device registered successfully", body = DeviceResponse),
        (status = 400, description = "Invalid request or unknown user/subscription", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_device(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<DeviceCreate>,
) -> Result<(StatusCode, Json<DeviceResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let device = state.store.create_device(&DeviceCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(DeviceResponse::from(device))))
}

#[utoipa::path(
    get,
    path = "/devices/{device_id}",
    tag = "devices",
    summary = "Get device",
    responses(
        (status = 200, description = "Device details", body = DeviceResponse),
        (status = 400, description = "Malformed device ID", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("device_id" = uuid::Uuid, Path, description = "Device ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_device(State(state): State<AppState>, ApiPath(device_id): ApiPath<DeviceId>) -> Result<Json<DeviceResponse>> {
    let device = state.store.get_device(device_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Device".to_string(),
        id: device_id.to_string(),
    })?;

    Ok(Json(DeviceResponse::from(device)))
}

#[utoipa::path(
    put,
    path = "/devices/{device_id}",
    tag = "devices",
    summary = "Update device",
    request_body = DeviceUpdate,
    responses(
        (status = 200, description = "Device updated successfully", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("device_id" = uuid::Uuid, Path, description = "Device ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_device(
    State(state): State<AppState>,
    ApiPath(device_id): ApiPath<DeviceId>,
    ApiJson(update): ApiJson<DeviceUpdate>,
) -> Result<Json<DeviceResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;

    let device = state
        .store
        .update_device(device_id, &DeviceUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Device", device_id))?;

    Ok(Json(DeviceResponse::from(device)))
}

#[utoipa::path(
    delete,
    path = "/devices/{device_id}",
    tag = "devices",
    summary = "Delete device",
    description = "Also deletes the device's recorded telemetry.",
    responses(
        (status = 200, description = "Device deleted successfully", body = MessageResponse),
        (status = 404, description = "Device not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("device_id" = uuid::Uuid, Path, description = "Device ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_device(
    State(state): State<AppState>,
    ApiPath(device_id): ApiPath<DeviceId>,
) -> Result<Json<MessageResponse>> {
    if state.store.delete_device(device_id).await? {
        Ok(Json(MessageResponse::deleted("Device")))
    } else {
        Err(Error::NotFound {
            resource: "Device".to_string(),
            id: device_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::devices::{DeviceResponse, DeviceStatus};
    use crate::api::models::subscriptions::SubscriptionResponse;
    use crate::test_utils::{create_test_app, create_test_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_create_defaults_to_offline() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "dish@example.com").await;

        let response = server
            .post("/api/devices")
            .json(&json!({"user_id": user.id, "device_type": "terminal"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let device = response.json::<DeviceResponse>();
        assert_eq!(device.status, DeviceStatus::Offline);
        assert_eq!(device.uptime_seconds, 0);
    }

    #[tokio::test]
    async fn test_subscription_delete_detaches_device() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "detach@example.com").await;
        let subscription = server
            .post("/api/subscriptions")
            .json(&json!({"user_id": user.id, "subscription_number": "SUB-D", "nickname": "Boat"}))
            .await
            .json::<SubscriptionResponse>();
        let device = server
            .post("/api/devices")
            .json(&json!({"user_id": user.id, "subscription_id": subscription.id, "device_type": "terminal"}))
            .await
            .json::<DeviceResponse>();

        let fetched = server.get(&format!("/api/devices/{}", device.id)).await.json::<DeviceResponse>();
        assert_eq!(fetched.subscription_name.as_deref(), Some("Boat"));

        server
            .delete(&format!("/api/subscriptions/{}", subscription.id))
            .await
            .assert_status_ok();

        let fetched = server.get(&format!("/api/devices/{}", device.id)).await.json::<DeviceResponse>();
        assert_eq!(fetched.subscription_id, None);
        assert_eq!(fetched.subscription_name, None);
    }

    #[tokio::test]
    async fn test_update_status_keeps_other_fields() {
        let server = create_test_app().await;
        let user = create_test_user(&server, "update@example.com").await;
        let device = server
            .post("/api/devices")
            .json(&json!({
                "user_id": user.id,
                "device_type": "router",
                "device_name": "Kitchen mesh",
                "software_version": "2024.03.1"
            }))
            .await
            .json::<DeviceResponse>();

        let response = server
            .put(&format!("/api/devices/{}", device.id))
            .json(&json!({"status": "online", "uptime_seconds": 3600}))
            .await;
        response.assert_status_ok();
        let updated = response.json::<DeviceResponse>();
        assert_eq!(updated.status, DeviceStatus::Online);
        assert_eq!(updated.uptime_seconds, 3600);
        assert_eq!(updated.device_name.as_deref(), Some("Kitchen mesh"));
        assert_eq!(updated.software_version.as_deref(), Some("2024.03.1"));
    }

    #[tokio::test]
    async fn test_missing_device() {
        let server = create_test_app().await;
        let missing = uuid::Uuid::new_v4();

        let response = server.get(&format!("/api/devices/{missing}")).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>()["error"],
            format!("Device with ID {missing} not found")
        );

        server
            .put(&format!("/api/devices/{missing}"))
            .json(&json!({"status": "online"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/devices/{missing}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
