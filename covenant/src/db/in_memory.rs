//! In-memory storage implementation.
//!
//! All tables live behind a single `parking_lot::RwLock`, so rules that span tables (foreign
//! keys, cascading deletes, the single account owner) are applied atomically. It mirrors the
//! constraints of the PostgreSQL schema: unique emails and document numbers, foreign keys,
//! `ON DELETE CASCADE` / `SET NULL`, and the owner rules. Data is lost on restart.
//!
//! Suitable for local development (`database.type: memory`) and the HTTP test-suite.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use sqlx::types::Json;
use uuid::Uuid;

use crate::api::models::users::Role;
use crate::db::errors::{DbError, Result};
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
use crate::types::{BillingInfoId, DeviceId, InvoiceId, OrderId, Operation, SubscriptionId, UserId};

use super::store::Store;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserDBResponse>,
    subscriptions: HashMap<SubscriptionId, SubscriptionDBResponse>,
    orders: HashMap<OrderId, OrderDBResponse>,
    invoices: HashMap<InvoiceId, InvoiceDBResponse>,
    devices: HashMap<DeviceId, DeviceDBResponse>,
    billing: HashMap<BillingInfoId, BillingInfoDBResponse>,
    metrics: Vec<DeviceMetricDBResponse>,
}

impl Tables {
    fn user_details(&self, user_id: UserId) -> (Option<String>, Option<String>) {
        match self.users.get(&user_id) {
            Some(user) => (Some(user.name.clone()), Some(user.email.clone())),
            None => (None, None),
        }
    }

    fn subscription_name(&self, id: Option<SubscriptionId>) -> Option<String> {
        id.and_then(|id| self.subscriptions.get(&id)).and_then(|s| s.nickname.clone())
    }

    fn require_user(&self, table: &str, user_id: UserId) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(foreign_key_violation(table, "user_id"))
        }
    }

    fn require_subscription(&self, table: &str, id: Option<SubscriptionId>) -> Result<()> {
        match id {
            Some(id) if !self.subscriptions.contains_key(&id) => Err(foreign_key_violation(table, "subscription_id")),
            _ => Ok(()),
        }
    }

    /// `ON DELETE SET NULL` for invoices and devices
    fn remove_subscription(&mut self, id: SubscriptionId) -> bool {
        if self.subscriptions.remove(&id).is_none() {
            return false;
        }
        let now = Utc::now();
        for invoice in self.invoices.values_mut().filter(|i| i.subscription_id == Some(id)) {
            invoice.subscription_id = None;
            invoice.updated_at = now;
        }
        for device in self.devices.values_mut().filter(|d| d.subscription_id == Some(id)) {
            device.subscription_id = None;
            device.updated_at = now;
        }
        true
    }

    fn remove_device(&mut self, id: DeviceId) -> bool {
        if self.devices.remove(&id).is_none() {
            return false;
        }
        self.metrics.retain(|m| m.device_id != id);
        true
    }

    /// `ON DELETE CASCADE` for everything a user owns
    fn remove_user_rows(&mut self, user_id: UserId) {
        let subscriptions: Vec<SubscriptionId> =
            self.subscriptions.values().filter(|s| s.user_id == user_id).map(|s| s.id).collect();
        for id in subscriptions {
            self.remove_subscription(id);
        }
        let devices: Vec<DeviceId> = self.devices.values().filter(|d| d.user_id == user_id).map(|d| d.id).collect();
        for id in devices {
            self.remove_device(id);
        }
        self.orders.retain(|_, o| o.user_id != user_id);
        self.invoices.retain(|_, i| i.user_id != user_id);
        self.billing.retain(|_, b| b.user_id != user_id);
    }

    fn joined_subscription(&self, mut row: SubscriptionDBResponse) -> SubscriptionDBResponse {
        (row.user_name, row.user_email) = self.user_details(row.user_id);
        row
    }

    fn joined_order(&self, mut row: OrderDBResponse) -> OrderDBResponse {
        (row.user_name, row.user_email) = self.user_details(row.user_id);
        row
    }

    fn joined_invoice(&self, mut row: InvoiceDBResponse) -> InvoiceDBResponse {
        (row.user_name, row.user_email) = self.user_details(row.user_id);
        row.subscription_name = self.subscription_name(row.subscription_id);
        row
    }

    fn joined_device(&self, mut row: DeviceDBResponse) -> DeviceDBResponse {
        (row.user_name, row.user_email) = self.user_details(row.user_id);
        row.subscription_name = self.subscription_name(row.subscription_id);
        row
    }

    fn joined_billing(&self, mut row: BillingInfoDBResponse) -> BillingInfoDBResponse {
        (row.user_name, row.user_email) = self.user_details(row.user_id);
        row
    }
}

fn foreign_key_violation(table: &str, column: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(format!("{table}_{column}_fkey")),
        table: Some(table.to_string()),
        message: format!("insert or update on table \"{table}\" violates foreign key on column \"{column}\""),
    }
}

fn unique_violation(table: &str, constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

/// `LIMIT .. OFFSET ..` over an already sorted result set
fn page<T>(rows: Vec<T>, skip: i64, limit: Option<i64>) -> Vec<T> {
    let take = limit.map_or(usize::MAX, |l| l.max(0) as usize);
    rows.into_iter().skip(skip.max(0) as usize).take(take).collect()
}

fn set<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

fn set_opt<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *field = value.clone();
    }
}

/// In-memory implementation of the [`Store`] trait.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<UserDBResponse> = tables
            .users
            .values()
            .filter(|u| filter.role.is_none_or(|role| u.role == role))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(rows, filter.skip, filter.limit))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == request.email) {
            return Err(unique_violation("users", "users_email_unique"));
        }

        let has_owner = tables.users.values().any(|u| u.is_owner);
        let (role, is_owner) = if has_owner { (request.role, false) } else { (Role::Owner, true) };

        let now = Utc::now();
        let user = UserDBResponse {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            name: request.name.clone(),
            phone: request.phone.clone(),
            role,
            is_owner,
            shipping_address_line1: request.shipping_address_line1.clone(),
            shipping_address_line2: request.shipping_address_line2.clone(),
            shipping_city: request.shipping_city.clone(),
            shipping_state: request.shipping_state.clone(),
            shipping_zip: request.shipping_zip.clone(),
            shipping_country: request.shipping_country.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        if let Some(email) = &request.email
            && tables.users.values().any(|u| u.id != id && &u.email == email)
        {
            return Err(unique_violation("users", "users_email_unique"));
        }

        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        set(&mut user.email, &request.email);
        set(&mut user.name, &request.name);
        set_opt(&mut user.phone, &request.phone);
        if !user.is_owner {
            set(&mut user.role, &request.role);
        }
        set_opt(&mut user.shipping_address_line1, &request.shipping_address_line1);
        set_opt(&mut user.shipping_address_line2, &request.shipping_address_line2);
        set_opt(&mut user.shipping_city, &request.shipping_city);
        set_opt(&mut user.shipping_state, &request.shipping_state);
        set_opt(&mut user.shipping_zip, &request.shipping_zip);
        set_opt(&mut user.shipping_country, &request.shipping_country);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut tables = self.tables.write();
        let Some(user) = tables.users.get(&id) else {
            return Ok(false);
        };
        if user.is_owner && tables.users.len() > 1 {
            return Err(DbError::ProtectedEntity {
                operation: Operation::Delete,
                reason: "the account owner cannot be deleted, transfer ownership first".to_string(),
                entity_type: "user".to_string(),
                entity_id: Some(id.to_string()),
            });
        }

        tables.users.remove(&id);
        tables.remove_user_rows(id);
        Ok(true)
    }

    async fn get_owner(&self) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.values().find(|u| u.is_owner).cloned())
    }

    async fn transfer_ownership(&self, id: UserId) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&id) {
            return Err(DbError::NotFound);
        }

        let now = Utc::now();
        for previous in tables.users.values_mut().filter(|u| u.is_owner && u.id != id) {
            previous.is_owner = false;
            if previous.role == Role::Owner {
                previous.role = Role::Admin;
            }
            previous.updated_at = now;
        }

        let owner = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        owner.is_owner = true;
        owner.role = Role::Owner;
        owner.updated_at = now;
        Ok(owner.clone())
    }

    async fn list_subscriptions(&self, filter: &SubscriptionFilter) -> Result<Vec<SubscriptionDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<SubscriptionDBResponse> = tables
            .subscriptions
            .values()
            .filter(|s| filter.user_id.is_none_or(|user_id| s.user_id == user_id))
            .filter(|s| filter.status.is_none_or(|status| s.status == status))
            .map(|s| tables.joined_subscription(s.clone()))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(rows, filter.skip, filter.limit))
    }

    async fn get_subscription(&self, id: SubscriptionId) -> Result<Option<SubscriptionDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.subscriptions.get(&id).map(|s| tables.joined_subscription(s.clone())))
    }

    async fn create_subscription(&self, request: &SubscriptionCreateDBRequest) -> Result<SubscriptionDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("subscriptions", request.user_id)?;
        if tables.subscriptions.values().any(|s| s.subscription_number == request.subscription_number) {
            return Err(unique_violation("subscriptions", "subscriptions_number_unique"));
        }

        let now = Utc::now();
        let subscription = SubscriptionDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            subscription_number: request.subscription_number.clone(),
            nickname: request.nickname.clone(),
            service_location: request.service_location.clone(),
            service_plan: request.service_plan.clone(),
            status: request.status,
            ip_policy: request.ip_policy.clone(),
            monthly_data_gb: request.monthly_data_gb,
            data_used_gb: request.data_used_gb,
            auto_top_up: request.auto_top_up,
            billing_cycle_start: request.billing_cycle_start,
            billing_cycle_end: request.billing_cycle_end,
            created_at: now,
            updated_at: now,
            user_name: None,
            user_email: None,
        };
        tables.subscriptions.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn update_subscription(&self, id: SubscriptionId, request: &SubscriptionUpdateDBRequest) -> Result<SubscriptionDBResponse> {
        let mut tables = self.tables.write();
        if !tables.subscriptions.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        if let Some(user_id) = request.user_id {
            tables.require_user("subscriptions", user_id)?;
        }
        if let Some(number) = &request.subscription_number
            && tables.subscriptions.values().any(|s| s.id != id && &s.subscription_number == number)
        {
            return Err(unique_violation("subscriptions", "subscriptions_number_unique"));
        }

        let subscription = tables.subscriptions.get_mut(&id).ok_or(DbError::NotFound)?;
        set(&mut subscription.user_id, &request.user_id);
        set(&mut subscription.subscription_number, &request.subscription_number);
        set_opt(&mut subscription.nickname, &request.nickname);
        set_opt(&mut subscription.service_location, &request.service_location);
        set_opt(&mut subscription.service_plan, &request.service_plan);
        set(&mut subscription.status, &request.status);
        set(&mut subscription.ip_policy, &request.ip_policy);
        set(&mut subscription.monthly_data_gb, &request.monthly_data_gb);
        set(&mut subscription.data_used_gb, &request.data_used_gb);
        set(&mut subscription.auto_top_up, &request.auto_top_up);
        set_opt(&mut subscription.billing_cycle_start, &request.billing_cycle_start);
        set_opt(&mut subscription.billing_cycle_end, &request.billing_cycle_end);
        subscription.updated_at = Utc::now();
        Ok(subscription.clone())
    }

    async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool> {
        Ok(self.tables.write().remove_subscription(id))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<OrderDBResponse> = tables
            .orders
            .values()
            .filter(|o| filter.user_id.is_none_or(|user_id| o.user_id == user_id))
            .filter(|o| filter.status.is_none_or(|status| o.status == status))
            .map(|o| tables.joined_order(o.clone()))
            .collect();
        rows.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(page(rows, filter.skip, filter.limit))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.orders.get(&id).map(|o| tables.joined_order(o.clone())))
    }

    async fn create_order(&self, request: &OrderCreateDBRequest) -> Result<OrderDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("orders", request.user_id)?;
        if tables.orders.values().any(|o| o.order_number == request.order_number) {
            return Err(unique_violation("orders", "orders_number_unique"));
        }

        let now = Utc::now();
        let order = OrderDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            order_number: request.order_number.clone(),
            order_date: request.order_date,
            status: request.status,
            item_name: request.item_name.clone(),
            item_description: request.item_description.clone(),
            tracking_number: request.tracking_number.clone(),
            tracking_url: request.tracking_url.clone(),
            estimated_delivery: request.estimated_delivery,
            total_amount: request.total_amount,
            subtotal: request.subtotal,
            tax: request.tax,
            shipping_cost: request.shipping_cost,
            shipping_address: request.shipping_address.clone(),
            items: Json(request.items.clone()),
            created_at: now,
            updated_at: now,
            user_name: None,
            user_email: None,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update_order(&self, id: OrderId, request: &OrderUpdateDBRequest) -> Result<OrderDBResponse> {
        let mut tables = self.tables.write();
        if !tables.orders.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        if let Some(number) = &request.order_number
            && tables.orders.values().any(|o| o.id != id && &o.order_number == number)
        {
            return Err(unique_violation("orders", "orders_number_unique"));
        }

        let order = tables.orders.get_mut(&id).ok_or(DbError::NotFound)?;
        set(&mut order.order_number, &request.order_number);
        set(&mut order.order_date, &request.order_date);
        set(&mut order.status, &request.status);
        set_opt(&mut order.item_name, &request.item_name);
        set_opt(&mut order.item_description, &request.item_description);
        set_opt(&mut order.tracking_number, &request.tracking_number);
        set_opt(&mut order.tracking_url, &request.tracking_url);
        set_opt(&mut order.estimated_delivery, &request.estimated_delivery);
        set_opt(&mut order.total_amount, &request.total_amount);
        set_opt(&mut order.subtotal, &request.subtotal);
        set_opt(&mut order.tax, &request.tax);
        set_opt(&mut order.shipping_cost, &request.shipping_cost);
        set_opt(&mut order.shipping_address, &request.shipping_address);
        if let Some(items) = &request.items {
            order.items = Json(items.clone());
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        Ok(self.tables.write().orders.remove(&id).is_some())
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<InvoiceDBResponse> = tables
            .invoices
            .values()
            .filter(|i| filter.user_id.is_none_or(|user_id| i.user_id == user_id))
            .filter(|i| filter.subscription_id.is_none_or(|id| i.subscription_id == Some(id)))
            .filter(|i| filter.status.is_none_or(|status| i.status == status))
            .map(|i| tables.joined_invoice(i.clone()))
            .collect();
        rows.sort_by(|a, b| (b.invoice_date, b.created_at).cmp(&(a.invoice_date, a.created_at)));
        Ok(page(rows, filter.skip, filter.limit))
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<InvoiceDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.invoices.get(&id).map(|i| tables.joined_invoice(i.clone())))
    }

    async fn create_invoice(&self, request: &InvoiceCreateDBRequest) -> Result<InvoiceDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("invoices", request.user_id)?;
        tables.require_subscription("invoices", request.subscription_id)?;
        if tables.invoices.values().any(|i| i.invoice_number == request.invoice_number) {
            return Err(unique_violation("invoices", "invoices_number_unique"));
        }

        let now = Utc::now();
        let invoice = InvoiceDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            subscription_id: request.subscription_id,
            invoice_number: request.invoice_number.clone(),
            invoice_date: request.invoice_date,
            due_date: request.due_date,
            description: request.description.clone(),
            payment_method: request.payment_method.clone(),
            total_amount: request.total_amount,
            balance_due: request.balance_due,
            status: request.status,
            pdf_url: request.pdf_url.clone(),
            created_at: now,
            updated_at: now,
            user_name: None,
            user_email: None,
            subscription_name: None,
        };
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn update_invoice(&self, id: InvoiceId, request: &InvoiceUpdateDBRequest) -> Result<InvoiceDBResponse> {
        let mut tables = self.tables.write();
        if !tables.invoices.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        tables.require_subscription("invoices", request.subscription_id)?;
        if let Some(number) = &request.invoice_number
            && tables.invoices.values().any(|i| i.id != id && &i.invoice_number == number)
        {
            return Err(unique_violation("invoices", "invoices_number_unique"));
        }

        let invoice = tables.invoices.get_mut(&id).ok_or(DbError::NotFound)?;
        set_opt(&mut invoice.subscription_id, &request.subscription_id);
        set(&mut invoice.invoice_number, &request.invoice_number);
        set(&mut invoice.invoice_date, &request.invoice_date);
        set(&mut invoice.due_date, &request.due_date);
        set_opt(&mut invoice.description, &request.description);
        set_opt(&mut invoice.payment_method, &request.payment_method);
        set(&mut invoice.total_amount, &request.total_amount);
        set(&mut invoice.balance_due, &request.balance_due);
        set(&mut invoice.status, &request.status);
        set_opt(&mut invoice.pdf_url, &request.pdf_url);
        invoice.updated_at = Utc::now();
        Ok(invoice.clone())
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<bool> {
        Ok(self.tables.write().invoices.remove(&id).is_some())
    }

    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<DeviceDBResponse> = tables
            .devices
            .values()
            .filter(|d| filter.user_id.is_none_or(|user_id| d.user_id == user_id))
            .filter(|d| filter.subscription_id.is_none_or(|id| d.subscription_id == Some(id)))
            .filter(|d| filter.status.is_none_or(|status| d.status == status))
            .map(|d| tables.joined_device(d.clone()))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(rows, filter.skip, filter.limit))
    }

    async fn get_device(&self, id: DeviceId) -> Result<Option<DeviceDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.devices.get(&id).map(|d| tables.joined_device(d.clone())))
    }

    async fn create_device(&self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("devices", request.user_id)?;
        tables.require_subscription("devices", request.subscription_id)?;

        let now = Utc::now();
        let device = DeviceDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            subscription_id: request.subscription_id,
            device_type: request.device_type.clone(),
            device_name: request.device_name.clone(),
            starlink_id: request.starlink_id.clone(),
            serial_number: request.serial_number.clone(),
            kit_number: request.kit_number.clone(),
            software_version: request.software_version.clone(),
            status: request.status,
            uptime_seconds: request.uptime_seconds,
            last_updated: None,
            created_at: now,
            updated_at: now,
            user_name: None,
            user_email: None,
            subscription_name: None,
        };
        tables.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn update_device(&self, id: DeviceId, request: &DeviceUpdateDBRequest) -> Result<DeviceDBResponse> {
        let mut tables = self.tables.write();
        if !tables.devices.contains_key(&id) {
            return Err(DbError::NotFound);
        }
        tables.require_subscription("devices", request.subscription_id)?;

        let device = tables.devices.get_mut(&id).ok_or(DbError::NotFound)?;
        set_opt(&mut device.subscription_id, &request.subscription_id);
        set(&mut device.device_type, &request.device_type);
        set_opt(&mut device.device_name, &request.device_name);
        set_opt(&mut device.starlink_id, &request.starlink_id);
        set_opt(&mut device.serial_number, &request.serial_number);
        set_opt(&mut device.kit_number, &request.kit_number);
        set_opt(&mut device.software_version, &request.software_version);
        set(&mut device.status, &request.status);
        set(&mut device.uptime_seconds, &request.uptime_seconds);
        set_opt(&mut device.last_updated, &request.last_updated);
        device.updated_at = Utc::now();
        Ok(device.clone())
    }

    async fn delete_device(&self, id: DeviceId) -> Result<bool> {
        Ok(self.tables.write().remove_device(id))
    }

    async fn list_device_metrics(&self, device_id: DeviceId, filter: &DeviceMetricFilter) -> Result<Vec<DeviceMetricDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<DeviceMetricDBResponse> = tables
            .metrics
            .iter()
            .filter(|m| m.device_id == device_id && m.recorded_at >= filter.since)
            .filter(|m| filter.metric_type.is_none_or(|metric_type| m.metric_type == metric_type))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(rows)
    }

    async fn record_device_metric(&self, request: &DeviceMetricCreateDBRequest) -> Result<DeviceMetricDBResponse> {
        let mut tables = self.tables.write();
        if !tables.devices.contains_key(&request.device_id) {
            return Err(foreign_key_violation("device_metrics", "device_id"));
        }

        let metric = DeviceMetricDBResponse {
            id: Uuid::new_v4(),
            device_id: request.device_id,
            metric_type: request.metric_type,
            value: request.value,
            unit: request.unit.clone(),
            recorded_at: request.recorded_at,
        };
        tables.metrics.push(metric.clone());
        Ok(metric)
    }

    async fn list_billing_info(&self, filter: &BillingInfoFilter) -> Result<Vec<BillingInfoDBResponse>> {
        let tables = self.tables.read();
        let mut rows: Vec<BillingInfoDBResponse> = tables
            .billing
            .values()
            .filter(|b| filter.user_id.is_none_or(|user_id| b.user_id == user_id))
            .map(|b| tables.joined_billing(b.clone()))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(rows, filter.skip, filter.limit))
    }

    async fn get_billing_info(&self, id: BillingInfoId) -> Result<Option<BillingInfoDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.billing.get(&id).map(|b| tables.joined_billing(b.clone())))
    }

    async fn create_billing_info(&self, request: &BillingInfoCreateDBRequest) -> Result<BillingInfoDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("billing_info", request.user_id)?;

        let now = Utc::now();
        let billing = BillingInfoDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            cardholder_name: request.cardholder_name.clone(),
            card_last_four: request.card_last_four.clone(),
            card_type: request.card_type,
            expiry_month: request.expiry_month,
            expiry_year: request.expiry_year,
            billing_cycle_day: request.billing_cycle_day,
            available_credits: request.available_credits,
            is_primary: request.is_primary,
            created_at: now,
            updated_at: now,
            user_name: None,
            user_email: None,
        };
        tables.billing.insert(billing.id, billing.clone());
        Ok(billing)
    }

    async fn update_billing_info(&self, id: BillingInfoId, request: &BillingInfoUpdateDBRequest) -> Result<BillingInfoDBResponse> {
        let mut tables = self.tables.write();
        let billing = tables.billing.get_mut(&id).ok_or(DbError::NotFound)?;
        set_opt(&mut billing.cardholder_name, &request.cardholder_name);
        set_opt(&mut billing.card_last_four, &request.card_last_four);
        set_opt(&mut billing.card_type, &request.card_type);
        set_opt(&mut billing.expiry_month, &request.expiry_month);
        set_opt(&mut billing.expiry_year, &request.expiry_year);
        set(&mut billing.billing_cycle_day, &request.billing_cycle_day);
        set(&mut billing.available_credits, &request.available_credits);
        set(&mut billing.is_primary, &request.is_primary);
        billing.updated_at = Utc::now();
        Ok(billing.clone())
    }

    async fn delete_billing_info(&self, id: BillingInfoId) -> Result<bool> {
        Ok(self.tables.write().billing.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::device_metrics::MetricType;
    use crate::api::models::devices::DeviceStatus;
    use crate::api::models::subscriptions::SubscriptionStatus;
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;

    fn user_request(email: &str, role: Role) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            phone: None,
            role,
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
            service_plan: Some("Residential".to_string()),
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
            device_type: "Standard Kit".to_string(),
            device_name: Some("Roof dish".to_string()),
            starlink_id: None,
            serial_number: None,
            kit_number: None,
            software_version: None,
            status: DeviceStatus::Online,
            uptime_seconds: 0,
        }
    }

    fn invoice_request(user_id: UserId, subscription_id: Option<SubscriptionId>, number: &str) -> InvoiceCreateDBRequest {
        InvoiceCreateDBRequest {
            user_id,
            subscription_id,
            invoice_number: number.to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            description: None,
            payment_method: None,
            total_amount: Decimal::new(12000, 2),
            balance_due: Decimal::ZERO,
            status: Default::default(),
            pdf_url: None,
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_owner() {
        let store = InMemoryStore::new();

        let first = store.create_user(&user_request("first@example.com", Role::Viewer)).await.unwrap();
        assert!(first.is_owner);
        assert_eq!(first.role, Role::Owner);

        let second = store.create_user(&user_request("second@example.com", Role::Viewer)).await.unwrap();
        assert!(!second.is_owner);
        assert_eq!(second.role, Role::Viewer);

        let owner = store.get_owner().await.unwrap().unwrap();
        assert_eq!(owner.id, first.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        store.create_user(&user_request("dup@example.com", Role::User)).await.unwrap();

        let err = store.create_user(&user_request("dup@example.com", Role::User)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref table, .. } if table.as_deref() == Some("users")));
    }

    #[tokio::test]
    async fn test_owner_cannot_be_deleted_while_others_exist() {
        let store = InMemoryStore::new();
        let owner = store.create_user(&user_request("owner@example.com", Role::User)).await.unwrap();
        let member = store.create_user(&user_request("member@example.com", Role::User)).await.unwrap();

        let err = store.delete_user(owner.id).await.unwrap_err();
        assert!(matches!(err, DbError::ProtectedEntity { .. }));

        assert!(store.delete_user(member.id).await.unwrap());
        assert!(store.delete_user(owner.id).await.unwrap());
        assert!(!store.delete_user(owner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_transfer_ownership_demotes_previous_owner() {
        let store = InMemoryStore::new();
        let owner = store.create_user(&user_request("owner@example.com", Role::User)).await.unwrap();
        let member = store.create_user(&user_request("member@example.com", Role::User)).await.unwrap();

        let new_owner = store.transfer_ownership(member.id).await.unwrap();
        assert!(new_owner.is_owner);
        assert_eq!(new_owner.role, Role::Owner);

        let previous = store.get_user(owner.id).await.unwrap().unwrap();
        assert!(!previous.is_owner);
        assert_eq!(previous.role, Role::Admin);

        let owners: Vec<_> = store
            .list_users(&UserFilter::default())
            .await
            .unwrap()
            .into_iter()
            .filter(|u| u.is_owner)
            .collect();
        assert_eq!(owners.len(), 1);

        let err = store.transfer_ownership(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_owner_role_is_pinned_on_update() {
        let store = InMemoryStore::new();
        let owner = store.create_user(&user_request("owner@example.com", Role::User)).await.unwrap();

        let update = UserUpdateDBRequest {
            role: Some(Role::Viewer),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = store.update_user(owner.id, &update).await.unwrap();
        assert_eq!(updated.role, Role::Owner);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "owner@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update_device(Uuid::new_v4(), &DeviceUpdateDBRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let store = InMemoryStore::new();

        let err = store.create_subscription(&subscription_request(Uuid::new_v4(), "SUB-1")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let user = store.create_user(&user_request("a@example.com", Role::User)).await.unwrap();
        let err = store.create_device(&device_request(user.id, Some(Uuid::new_v4()))).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_reads_include_joined_names() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("jo@example.com", Role::User)).await.unwrap();
        let subscription = store.create_subscription(&subscription_request(user.id, "SUB-1")).await.unwrap();
        assert_eq!(subscription.user_name, None);

        let device = store.create_device(&device_request(user.id, Some(subscription.id))).await.unwrap();
        let fetched = store.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(fetched.user_name.as_deref(), Some("jo"));
        assert_eq!(fetched.user_email.as_deref(), Some("jo@example.com"));
        assert_eq!(fetched.subscription_name.as_deref(), Some("Cabin"));
    }

    #[tokio::test]
    async fn test_deleting_subscription_detaches_devices_and_invoices() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("a@example.com", Role::User)).await.unwrap();
        let subscription = store.create_subscription(&subscription_request(user.id, "SUB-1")).await.unwrap();
        let device = store.create_device(&device_request(user.id, Some(subscription.id))).await.unwrap();
        let invoice = store
            .create_invoice(&invoice_request(user.id, Some(subscription.id), "INV-1"))
            .await
            .unwrap();

        assert!(store.delete_subscription(subscription.id).await.unwrap());

        let device = store.get_device(device.id).await.unwrap().unwrap();
        assert_eq!(device.subscription_id, None);
        assert_eq!(device.subscription_name, None);
        let invoice = store.get_invoice(invoice.id).await.unwrap().unwrap();
        assert_eq!(invoice.subscription_id, None);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("a@example.com", Role::User)).await.unwrap();
        let subscription = store.create_subscription(&subscription_request(user.id, "SUB-1")).await.unwrap();
        let device = store.create_device(&device_request(user.id, Some(subscription.id))).await.unwrap();
        store
            .record_device_metric(&DeviceMetricCreateDBRequest {
                device_id: device.id,
                metric_type: MetricType::Latency,
                value: 31.0,
                unit: "ms".to_string(),
                recorded_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());

        assert!(store.get_subscription(subscription.id).await.unwrap().is_none());
        assert!(store.get_device(device.id).await.unwrap().is_none());
        let filter = DeviceMetricFilter {
            since: Utc::now() - Duration::days(1),
            metric_type: None,
        };
        assert!(store.list_device_metrics(device.id, &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_are_windowed_and_ascending() {
        let store = InMemoryStore::new();
        let user = store.create_user(&user_request("a@example.com", Role::User)).await.unwrap();
        let device = store.create_device(&device_request(user.id, None)).await.unwrap();

        let now = Utc::now();
        for (minutes_ago, metric_type) in [
            (5, MetricType::DownloadSpeed),
            (60, MetricType::DownloadSpeed),
            (10, MetricType::Latency),
            (1, MetricType::DownloadSpeed),
        ] {
            store
                .record_device_metric(&DeviceMetricCreateDBRequest {
                    device_id: device.id,
                    metric_type,
                    value: minutes_ago as f64,
                    unit: metric_type.default_unit().to_string(),
                    recorded_at: now - Duration::minutes(minutes_ago),
                })
                .await
                .unwrap();
        }

        let filter = DeviceMetricFilter {
            since: now - Duration::minutes(15),
            metric_type: None,
        };
        let values: Vec<f64> = store
            .list_device_metrics(device.id, &filter)
            .await
            .unwrap()
            .iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![10.0, 5.0, 1.0]);

        let filter = DeviceMetricFilter {
            since: now - Duration::hours(3),
            metric_type: Some(MetricType::DownloadSpeed),
        };
        let values: Vec<f64> = store
            .list_device_metrics(device.id, &filter)
            .await
            .unwrap()
            .iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![60.0, 5.0, 1.0]);

        let err = store
            .record_device_metric(&DeviceMetricCreateDBRequest {
                device_id: Uuid::new_v4(),
                metric_type: MetricType::Latency,
                value: 1.0,
                unit: "ms".to_string(),
                recorded_at: now,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let store = InMemoryStore::new();
        let alice = store.create_user(&user_request("alice@example.com", Role::User)).await.unwrap();
        let bob = store.create_user(&user_request("bob@example.com", Role::User)).await.unwrap();
        for n in 0..3 {
            store
                .create_subscription(&subscription_request(alice.id, &format!("SUB-A{n}")))
                .await
                .unwrap();
        }
        store.create_subscription(&subscription_request(bob.id, "SUB-B0")).await.unwrap();

        let mut filter = SubscriptionFilter::new(0, None);
        assert_eq!(store.list_subscriptions(&filter).await.unwrap().len(), 4);

        filter.user_id = Some(alice.id);
        let rows = store.list_subscriptions(&filter).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|s| s.user_email.as_deref() == Some("alice@example.com")));

        let paged = SubscriptionFilter {
            user_id: Some(alice.id),
            ..SubscriptionFilter::new(1, Some(1))
        };
        assert_eq!(store.list_subscriptions(&paged).await.unwrap().len(), 1);

        let skip_all = SubscriptionFilter::new(10, None);
        assert!(store.list_subscriptions(&skip_all).await.unwrap().is_empty());

        let err = store.create_subscription(&subscription_request(bob.id, "SUB-A0")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
