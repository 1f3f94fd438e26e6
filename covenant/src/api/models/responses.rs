//! Small response bodies shared across resources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Device with ID 5f0c... not found")]
    pub error: String,
}

/// Confirmation returned by deletes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Device deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn deleted(resource: &str) -> Self {
        Self {
            message: format!("{resource} deleted successfully"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Service banner served at `/`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceIndex {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}
