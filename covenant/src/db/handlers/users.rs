//! Database repository for users, including account ownership.

use crate::types::{Operation, UserId, abbrev_uuid};
use crate::{
    api::models::users::Role,
    db::{
        errors::{DbError, Result},
        handlers::repository::{Repository, push_pagination},
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub skip: i64,
    pub limit: Option<i64>,
}

impl UserFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, ..Default::default() }
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }
}

/// Serialise owner bookkeeping. Plain reads still go through; concurrent creates, deletes and
/// transfers wait for the holder to commit.
async fn lock_users(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
        .execute(conn)
        .await?;
    Ok(())
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// The account owner, if any user exists
    #[instrument(skip(self), err)]
    pub async fn get_owner(&mut self) -> Result<Option<UserDBResponse>> {
        let owner = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE is_owner LIMIT 1")
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(owner)
    }

    /// Make `id` the account owner. The previous owner loses the flag and drops to `admin`.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn transfer_ownership(&mut self, id: UserId) -> Result<UserDBResponse> {
        let mut tx = self.db.begin().await?;
        lock_users(&mut tx).await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(DbError::NotFound);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET is_owner = FALSE,
                role = CASE WHEN role = 'owner' THEN 'admin'::user_role ELSE role END,
                updated_at = NOW()
            WHERE is_owner AND id <> $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let owner = sqlx::query_as::<_, UserDBResponse>(
            "UPDATE users SET is_owner = TRUE, role = 'owner', updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(owner)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    /// The first user of the account becomes its owner.
    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        lock_users(&mut tx).await?;

        let has_owner: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE is_owner)")
            .fetch_one(&mut *tx)
            .await?;
        let (role, is_owner) = if has_owner { (request.role, false) } else { (Role::Owner, true) };

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (
                id, email, name, phone, role, is_owner,
                shipping_address_line1, shipping_address_line2, shipping_city,
                shipping_state, shipping_zip, shipping_country
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.phone)
        .bind(role)
        .bind(is_owner)
        .bind(&request.shipping_address_line1)
        .bind(&request.shipping_address_line2)
        .bind(&request.shipping_city)
        .bind(&request.shipping_state)
        .bind(&request.shipping_zip)
        .bind(&request.shipping_country)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM users WHERE TRUE");
        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role);
        }
        query.push(" ORDER BY created_at DESC");
        push_pagination(&mut query, filter.skip, filter.limit);

        let users = query.build_query_as::<UserDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(users)
    }

    /// The owner can only be deleted once nobody else is left on the account.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        lock_users(&mut tx).await?;

        let is_owner: Option<bool> = sqlx::query_scalar("SELECT is_owner FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        match is_owner {
            None => return Ok(false),
            Some(true) => {
                let others: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id <> $1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
                if others > 0 {
                    return Err(DbError::ProtectedEntity {
                        operation: Operation::Delete,
                        reason: "the account owner cannot be deleted, transfer ownership first".to_string(),
                        entity_type: "user".to_string(),
                        entity_id: Some(id.to_string()),
                    });
                }
            }
            Some(false) => {}
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// The owner's role stays `owner` whatever the request says.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                phone = COALESCE($4, phone),
                role = CASE WHEN is_owner THEN role ELSE COALESCE($5, role) END,
                shipping_address_line1 = COALESCE($6, shipping_address_line1),
                shipping_address_line2 = COALESCE($7, shipping_address_line2),
                shipping_city = COALESCE($8, shipping_city),
                shipping_state = COALESCE($9, shipping_state),
                shipping_zip = COALESCE($10, shipping_zip),
                shipping_country = COALESCE($11, shipping_country),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.phone)
        .bind(request.role)
        .bind(&request.shipping_address_line1)
        .bind(&request.shipping_address_line2)
        .bind(&request.shipping_city)
        .bind(&request.shipping_state)
        .bind(&request.shipping_zip)
        .bind(&request.shipping_country)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }
}
