use crate::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::models::responses::{ErrorResponse, MessageResponse};
use crate::api::models::users::{ListUsersQuery, UserCreate, UserResponse, UserUpdate};
use crate::db::handlers::users::UserFilter;
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, Result, not_found_as};
use crate::types::UserId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    responses(
        (status = 200, description = "Users, newest first", body = Vec<UserResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(ListUsersQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let filter = UserFilter::new(query.pagination.skip(), query.pagination.limit()).with_role(query.role);
    let users = state.store.list_users(&filter).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "The first user created on an account becomes its owner, whatever role was requested.",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email address already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    create.validate().map_err(|message| Error::BadRequest { message })?;

    let user = state.store.create_user(&UserCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/profile/owner",
    tag = "users",
    summary = "Get account owner",
    responses(
        (status = 200, description = "The account owner", body = UserResponse),
        (status = 404, description = "The account has no users yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_owner(State(state): State<AppState>) -> Result<Json<UserResponse>> {
    let owner = state.store.get_owner().await?.ok_or_else(|| Error::Missing {
        resource: "Owner user".to_string(),
    })?;

    Ok(Json(UserResponse::from(owner)))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Get user",
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 400, description = "Malformed user ID", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = uuid::Uuid, Path, description = "User ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, ApiPath(user_id): ApiPath<UserId>) -> Result<Json<UserResponse>> {
    let user = state.store.get_user(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Update user",
    description = "Omitted fields keep their stored value. The owner's role cannot be changed here.",
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email address already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = uuid::Uuid, Path, description = "User ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<UserResponse>> {
    update.validate().map_err(|message| Error::BadRequest { message })?;

    let user = state
        .store
        .update_user(user_id, &UserUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("User", user_id))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Delete user",
    description = "Deletes the user together with their subscriptions, orders, invoices, devices and billing details.",
    responses(
        (status = 200, description = "User deleted successfully", body = MessageResponse),
        (status = 403, description = "The owner cannot be deleted while other users exist", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = uuid::Uuid, Path, description = "User ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, ApiPath(user_id): ApiPath<UserId>) -> Result<Json<MessageResponse>> {
    if state.store.delete_user(user_id).await? {
        Ok(Json(MessageResponse::deleted("User")))
    } else {
        Err(Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        })
    }
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/owner",
    tag = "users",
    summary = "Transfer account ownership",
    description = "Makes the user the account owner. The previous owner keeps access with the `admin` role.",
    responses(
        (status = 200, description = "The new owner", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = uuid::Uuid, Path, description = "User ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn transfer_ownership(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<UserResponse>> {
    let owner = state
        .store
        .transfer_ownership(user_id)
        .await
        .map_err(not_found_as("User", user_id))?;

    tracing::info!(user_id = %user_id, "Account ownership transferred");
    Ok(Json(UserResponse::from(owner)))
}
