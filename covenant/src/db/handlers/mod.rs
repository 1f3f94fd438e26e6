//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (or transaction), provides strongly-typed
//! operations with parameter-bound SQL, and returns records from [`crate::db::models`].
//!
//! - [`Users`]: account users and ownership
//! - [`Subscriptions`]: service subscriptions
//! - [`Orders`]: hardware orders
//! - [`Invoices`]: invoices
//! - [`Devices`]: terminals and routers
//! - [`DeviceMetrics`]: append-only device telemetry
//! - [`BillingInfos`]: stored billing details
//!
//! ```ignore
//! use covenant::db::handlers::{Devices, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let device = Devices::new(&mut conn).get_by_id(device_id).await?;
//! ```

pub mod billing;
pub mod device_metrics;
pub mod devices;
pub mod invoices;
pub mod orders;
pub mod repository;
pub mod subscriptions;
pub mod users;

pub use billing::BillingInfos;
pub use device_metrics::DeviceMetrics;
pub use devices::Devices;
pub use invoices::Invoices;
pub use orders::Orders;
pub use repository::Repository;
pub use subscriptions::Subscriptions;
pub use users::Users;
