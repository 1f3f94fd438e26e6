//! PostgreSQL storage backend.
//!
//! Every call checks a connection out of the pool and hands it to the matching table
//! repository. Multi-statement operations (user creation, ownership transfer, owner-aware
//! deletes) open their own transaction inside the repository.

use crate::db::errors::Result;
use crate::db::handlers::{
    BillingInfos, DeviceMetrics, Devices, Invoices, Orders, Repository, Subscriptions, Users, billing::BillingInfoFilter,
    device_metrics::DeviceMetricFilter, devices::DeviceFilter, invoices::InvoiceFilter, orders::OrderFilter,
    subscriptions::SubscriptionFilter, users::UserFilter,
};
use crate::db::models::{
    billing::{BillingInfoCreateDBRequest, BillingInfoDBResponse, BillingInfoUpdateDBRequest},
    device_metrics::{DeviceMetricCreateDBRequest, DeviceMetricDBResponse},
    devices::{DeviceCreateDBRequest, DeviceDBResponse, DeviceUpdateDBRequest},
    invoices::{InvoiceCreateDBRequest, InvoiceDBResponse, InvoiceUpdateDBRequest},
    orders::{OrderCreateDBRequest, OrderDBResponse, OrderUpdateDBRequest},
    subscriptions::{SubscriptionCreateDBRequest, SubscriptionDBResponse, SubscriptionUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::db::store::Store;
use crate::types::{BillingInfoId, DeviceId, InvoiceId, OrderId, SubscriptionId, UserId};
use sqlx::PgPool;
use tracing::info;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).list(filter).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_id(id).await
    }

    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).update(id, request).await
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).delete(id).await
    }

    async fn get_owner(&self) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_owner().await
    }

    async fn transfer_ownership(&self, id: UserId) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).transfer_ownership(id).await
    }

    async fn list_subscriptions(&self, filter: &SubscriptionFilter) -> Result<Vec<SubscriptionDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Subscriptions::new(&mut conn).list(filter).await
    }

    async fn get_subscription(&self, id: SubscriptionId) -> Result<Option<SubscriptionDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Subscriptions::new(&mut conn).get_by_id(id).await
    }

    async fn create_subscription(&self, request: &SubscriptionCreateDBRequest) -> Result<SubscriptionDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Subscriptions::new(&mut conn).create(request).await
    }

    async fn update_subscription(&self, id: SubscriptionId, request: &SubscriptionUpdateDBRequest) -> Result<SubscriptionDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Subscriptions::new(&mut conn).update(id, request).await
    }

    async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Subscriptions::new(&mut conn).delete(id).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Orders::new(&mut conn).list(filter).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Orders::new(&mut conn).get_by_id(id).await
    }

    async fn create_order(&self, request: &OrderCreateDBRequest) -> Result<OrderDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Orders::new(&mut conn).create(request).await
    }

    async fn update_order(&self, id: OrderId, request: &OrderUpdateDBRequest) -> Result<OrderDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Orders::new(&mut conn).update(id, request).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Orders::new(&mut conn).delete(id).await
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Invoices::new(&mut conn).list(filter).await
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<InvoiceDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Invoices::new(&mut conn).get_by_id(id).await
    }

    async fn create_invoice(&self, request: &InvoiceCreateDBRequest) -> Result<InvoiceDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Invoices::new(&mut conn).create(request).await
    }

    async fn update_invoice(&self, id: InvoiceId, request: &InvoiceUpdateDBRequest) -> Result<InvoiceDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Invoices::new(&mut conn).update(id, request).await
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Invoices::new(&mut conn).delete(id).await
    }

    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Devices::new(&mut conn).list(filter).await
    }

    async fn get_device(&self, id: DeviceId) -> Result<Option<DeviceDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Devices::new(&mut conn).get_by_id(id).await
    }

    async fn create_device(&self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Devices::new(&mut conn).create(request).await
    }

    async fn update_device(&self, id: DeviceId, request: &DeviceUpdateDBRequest) -> Result<DeviceDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Devices::new(&mut conn).update(id, request).await
    }

    async fn delete_device(&self, id: DeviceId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Devices::new(&mut conn).delete(id).await
    }

    async fn list_device_metrics(&self, device_id: DeviceId, filter: &DeviceMetricFilter) -> Result<Vec<DeviceMetricDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        DeviceMetrics::new(&mut conn).list_for_device(device_id, filter).await
    }

    async fn record_device_metric(&self, request: &DeviceMetricCreateDBRequest) -> Result<DeviceMetricDBResponse> {
        let mut conn = self.pool.acquire().await?;
        DeviceMetrics::new(&mut conn).record(request).await
    }

    async fn list_billing_info(&self, filter: &BillingInfoFilter) -> Result<Vec<BillingInfoDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        BillingInfos::new(&mut conn).list(filter).await
    }

    async fn get_billing_info(&self, id: BillingInfoId) -> Result<Option<BillingInfoDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        BillingInfos::new(&mut conn).get_by_id(id).await
    }

    async fn create_billing_info(&self, request: &BillingInfoCreateDBRequest) -> Result<BillingInfoDBResponse> {
        let mut conn = self.pool.acquire().await?;
        BillingInfos::new(&mut conn).create(request).await
    }

    async fn update_billing_info(&self, id: BillingInfoId, request: &BillingInfoUpdateDBRequest) -> Result<BillingInfoDBResponse> {
        let mut conn = self.pool.acquire().await?;
        BillingInfos::new(&mut conn).update(id, request).await
    }

    async fn delete_billing_info(&self, id: BillingInfoId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        BillingInfos::new(&mut conn).delete(id).await
    }

    async fn close(&self) {
        info!("Closing database connections...");
        self.pool.close().await;
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::api::models::device_metrics::MetricType;
    use crate::api::models::devices::DeviceStatus;
    use crate::api::models::subscriptions::SubscriptionStatus;
    use crate::api::models::users::Role;
    use crate::db::errors::DbError;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn user_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            name: "Test User".to_string(),
            phone: None,
            role: Role::User,
            shipping_address_line1: None,
            shipping_address_line2: None,
            shipping_city: None,
            shipping_state: None,
            shipping_zip: None,
            shipping_country: None,
        }
    }

    fn subscription_request(user_id: UserId, number: &str) -> SubscriptionCreateDBRequest {
        SubscriptionCreateDBRequest {
            user_id,
            subscription_number: number.to_string(),
            nickname: Some("Cabin".to_string()),
            service_location: None,
            service_plan: None,
            status: SubscriptionStatus::Active,
            ip_policy: "default".to_string(),
            monthly_data_gb: 350,
            data_used_gb: 0.0,
            auto_top_up: false,
            billing_cycle_start: None,
            billing_cycle_end: None,
        }
    }

    fn device_request(user_id: UserId, subscription_id: Option<SubscriptionId>) -> DeviceCreateDBRequest {
        DeviceCreateDBRequest {
            user_id,
            subscription_id,
            device_type: "terminal".to_string(),
            device_name: None,
            starlink_id: None,
            serial_number: None,
            kit_number: None,
            software_version: None,
            status: DeviceStatus::Offline,
            uptime_seconds: 0,
        }
    }

    fn sample(device_id: DeviceId, value: f64, age: Duration) -> DeviceMetricCreateDBRequest {
        DeviceMetricCreateDBRequest {
            device_id,
            metric_type: MetricType::DownloadSpeed,
            value,
            unit: "Mbps".to_string(),
            recorded_at: Utc::now() - age,
        }
    }

    #[sqlx::test]
    async fn test_owner_lifecycle(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let owner = store.create_user(&user_request("owner@example.com")).await.unwrap();
        let member = store.create_user(&user_request("member@example.com")).await.unwrap();
        assert!(owner.is_owner);
        assert_eq!(owner.role, Role::Owner);
        assert!(!member.is_owner);

        let err = store.delete_user(owner.id).await.unwrap_err();
        assert!(matches!(err, DbError::ProtectedEntity { .. }));

        let new_owner = store.transfer_ownership(member.id).await.unwrap();
        assert!(new_owner.is_owner);
        let previous = store.get_user(owner.id).await.unwrap().unwrap();
        assert_eq!(previous.role, Role::Admin);
        assert_eq!(store.get_owner().await.unwrap().map(|u| u.id), Some(member.id));

        assert!(store.delete_user(owner.id).await.unwrap());
    }

    #[sqlx::test]
    async fn test_concurrent_first_users_get_a_single_owner(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let (first, second) = tokio::join!(
            store.create_user(&user_request("a@example.com")),
            store.create_user(&user_request("b@example.com"))
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(first.is_owner ^ second.is_owner);

        let owner = if first.is_owner { first } else { second };
        let (deleted, joined) = tokio::join!(
            store.delete_user(owner.id),
            store.create_user(&user_request("c@example.com"))
        );
        joined.unwrap();
        assert!(matches!(deleted.unwrap_err(), DbError::ProtectedEntity { .. }));
        assert_eq!(store.get_owner().await.unwrap().map(|u| u.id), Some(owner.id));
    }

    #[sqlx::test]
    async fn test_constraint_errors(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let user = store.create_user(&user_request("dup@example.com")).await.unwrap();

        let err = store.create_user(&user_request("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let err = store
            .create_subscription(&subscription_request(Uuid::new_v4(), "SUB-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        store.create_subscription(&subscription_request(user.id, "SUB-1")).await.unwrap();
        let err = store
            .create_subscription(&subscription_request(user.id, "SUB-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn test_subscription_delete_detaches_devices(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let user = store.create_user(&user_request("detach@example.com")).await.unwrap();
        let subscription = store.create_subscription(&subscription_request(user.id, "SUB-2")).await.unwrap();
        let device = store.create_device(&device_request(user.id, Some(subscription.id))).await.unwrap();

        let joined = store.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(joined.subscription_name.as_deref(), Some("Cabin"));
        assert_eq!(joined.user_email.as_deref(), Some("detach@example.com"));

        assert!(store.delete_subscription(subscription.id).await.unwrap());

        let device = store.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(device.subscription_id, None);
        assert_eq!(device.subscription_name, None);
    }

    #[sqlx::test]
    async fn test_metric_window_and_cascade(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let user = store.create_user(&user_request("metrics@example.com")).await.unwrap();
        let device = store.create_device(&device_request(user.id, None)).await.unwrap();

        for (value, age) in [(1.0, Duration::days(10)), (2.0, Duration::hours(2)), (3.0, Duration::minutes(1))] {
            store.record_device_metric(&sample(device.id, value, age)).await.unwrap();
        }

        let filter = DeviceMetricFilter {
            since: Utc::now() - Duration::days(7),
            metric_type: None,
        };
        let values: Vec<f64> = store
            .list_device_metrics(device.id, &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0]);

        assert!(store.delete_device(device.id).await.unwrap());
        assert!(store.list_device_metrics(device.id, &filter).await.unwrap().is_empty());

        let err = store.record_device_metric(&sample(device.id, 4.0, Duration::zero())).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
