//! Axum route handlers, one module per resource.

pub mod billing;
pub mod device_metrics;
pub mod devices;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod subscriptions;
pub mod users;
