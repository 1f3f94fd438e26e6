//! Database records and write requests.
//!
//! Write requests (`*CreateDBRequest`, `*UpdateDBRequest`) are built from API models with
//! defaults already applied, so every storage backend sees identical inputs. Responses
//! (`*DBResponse`) map rows with `sqlx::FromRow`; joined display columns are optional and
//! default to `None` when a query does not select them.

pub mod billing;
pub mod device_metrics;
pub mod devices;
pub mod invoices;
pub mod orders;
pub mod subscriptions;
pub mod users;
