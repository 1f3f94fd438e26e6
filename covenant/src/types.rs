//! Common type definitions shared by the API and database layers.
//!
//! All entity IDs are UUIDs wrapped in type aliases so signatures read in domain terms:
//!
//! - [`UserId`]: Account user identifier
//! - [`SubscriptionId`]: Service subscription identifier
//! - [`OrderId`]: Hardware order identifier
//! - [`InvoiceId`]: Invoice identifier
//! - [`DeviceId`]: Terminal/router identifier
//! - [`DeviceMetricId`]: Telemetry sample identifier
//! - [`BillingInfoId`]: Stored payment method identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type SubscriptionId = Uuid;
pub type OrderId = Uuid;
pub type InvoiceId = Uuid;
pub type DeviceId = Uuid;
pub type DeviceMetricId = Uuid;
pub type BillingInfoId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Mutation kinds, used when reporting why a write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}
