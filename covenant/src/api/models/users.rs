//! API request/response models for users.

use super::pagination::Pagination;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Account role. `owner` is held by exactly the account owner and only moves through an
/// ownership transfer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    #[default]
    User,
    Viewer,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    /// Defaults to `user`. The first user of an account becomes its owner regardless.
    /// `owner` is not accepted here.
    pub role: Option<Role>,
    pub shipping_address_line1: Option<String>,
    pub shipping_address_line2: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
    pub shipping_country: Option<String>,
}

/// Partial update: omitted fields keep their stored value. Ownership is not updatable here,
/// use the ownership transfer endpoint instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub shipping_address_line1: Option<String>,
    pub shipping_address_line2: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
    pub shipping_country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_owner: bool,
    pub shipping_address_line1: Option<String>,
    pub shipping_address_line2: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
    pub shipping_country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return users with this role
    pub role: Option<Role>,
}

fn reject_owner_role(role: Option<Role>) -> Result<(), String> {
    if role == Some(Role::Owner) {
        return Err("The owner role is assigned by transferring account ownership".to_string());
    }
    Ok(())
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("A valid email address is required".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Name must not be empty".to_string());
        }
        reject_owner_role(self.role)
    }
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email
            && (email.trim().is_empty() || !email.contains('@'))
        {
            return Err("A valid email address is required".to_string());
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err("Name must not be empty".to_string());
        }
        reject_owner_role(self.role)
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            name: db.name,
            phone: db.phone,
            role: db.role,
            is_owner: db.is_owner,
            shipping_address_line1: db.shipping_address_line1,
            shipping_address_line2: db.shipping_address_line2,
            shipping_city: db.shipping_city,
            shipping_state: db.shipping_state,
            shipping_zip: db.shipping_zip,
            shipping_country: db.shipping_country,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
