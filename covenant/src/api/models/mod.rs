//! API request and response data models.
//!
//! Each resource module contains:
//! - **Create** types: request bodies for POST
//! - **Update** types: partial request bodies for PUT, where omitted fields keep their value
//! - **Response** types: what the API returns, including joined display fields on reads
//! - **List query** types: optional filters plus [`pagination::Pagination`]
//!
//! Models implement `ToSchema` for the generated OpenAPI document and convert from the
//! corresponding [`crate::db::models`] records.

pub mod billing;
pub mod device_metrics;
pub mod devices;
pub mod invoices;
pub mod orders;
pub mod pagination;
pub mod responses;
pub mod subscriptions;
pub mod users;
