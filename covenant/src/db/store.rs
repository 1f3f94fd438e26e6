//! Storage trait shared by the API handlers.
//!
//! Handlers talk to an `Arc<dyn Store>` and never see which backend is behind it:
//!
//! - [`super::postgres::PostgresStore`]: production backend, delegating to the table
//!   repositories in [`super::handlers`]
//! - [`super::in_memory::InMemoryStore`]: process-local tables for development and tests
//!
//! Both backends take write requests with defaults already applied, return records without
//! joined display fields from writes, and include them on reads.
//!
//! Updates fail with [`crate::db::errors::DbError::NotFound`] when the row is missing;
//! deletes return whether the row existed.

use crate::db::errors::Result;
use crate::db::handlers::{
    billing::BillingInfoFilter, device_metrics::DeviceMetricFilter, devices::DeviceFilter, invoices::InvoiceFilter,
    orders::OrderFilter, subscriptions::SubscriptionFilter, users::UserFilter,
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
use crate::types::{BillingInfoId, DeviceId, InvoiceId, OrderId, SubscriptionId, UserId};

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>>;
    /// The first user created on an empty account becomes the owner
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;
    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse>;
    /// Refuses to delete the owner while other users remain
    async fn delete_user(&self, id: UserId) -> Result<bool>;
    async fn get_owner(&self) -> Result<Option<UserDBResponse>>;
    async fn transfer_ownership(&self, id: UserId) -> Result<UserDBResponse>;

    // Subscriptions
    async fn list_subscriptions(&self, filter: &SubscriptionFilter) -> Result<Vec<SubscriptionDBResponse>>;
    async fn get_subscription(&self, id: SubscriptionId) -> Result<Option<SubscriptionDBResponse>>;
    async fn create_subscription(&self, request: &SubscriptionCreateDBRequest) -> Result<SubscriptionDBResponse>;
    async fn update_subscription(&self, id: SubscriptionId, request: &SubscriptionUpdateDBRequest) -> Result<SubscriptionDBResponse>;
    async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool>;

    // Orders
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderDBResponse>>;
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDBResponse>>;
    async fn create_order(&self, request: &OrderCreateDBRequest) -> Result<OrderDBResponse>;
    async fn update_order(&self, id: OrderId, request: &OrderUpdateDBRequest) -> Result<OrderDBResponse>;
    async fn delete_order(&self, id: OrderId) -> Result<bool>;

    // Invoices
    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceDBResponse>>;
    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<InvoiceDBResponse>>;
    async fn create_invoice(&self, request: &InvoiceCreateDBRequest) -> Result<InvoiceDBResponse>;
    async fn update_invoice(&self, id: InvoiceId, request: &InvoiceUpdateDBRequest) -> Result<InvoiceDBResponse>;
    async fn delete_invoice(&self, id: InvoiceId) -> Result<bool>;

    // Devices
    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceDBResponse>>;
    async fn get_device(&self, id: DeviceId) -> Result<Option<DeviceDBResponse>>;
    async fn create_device(&self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse>;
    async fn update_device(&self, id: DeviceId, request: &DeviceUpdateDBRequest) -> Result<DeviceDBResponse>;
    /// Also removes the device's telemetry
    async fn delete_device(&self, id: DeviceId) -> Result<bool>;

    // Device telemetry
    async fn list_device_metrics(&self, device_id: DeviceId, filter: &DeviceMetricFilter) -> Result<Vec<DeviceMetricDBResponse>>;
    async fn record_device_metric(&self, request: &DeviceMetricCreateDBRequest) -> Result<DeviceMetricDBResponse>;

    // Billing details
    async fn list_billing_info(&self, filter: &BillingInfoFilter) -> Result<Vec<BillingInfoDBResponse>>;
    async fn get_billing_info(&self, id: BillingInfoId) -> Result<Option<BillingInfoDBResponse>>;
    async fn create_billing_info(&self, request: &BillingInfoCreateDBRequest) -> Result<BillingInfoDBResponse>;
    async fn update_billing_info(&self, id: BillingInfoId, request: &BillingInfoUpdateDBRequest) -> Result<BillingInfoDBResponse>;
    async fn delete_billing_info(&self, id: BillingInfoId) -> Result<bool>;

    /// Release backend resources on shutdown
    async fn close(&self) {}
}
