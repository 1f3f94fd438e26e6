//! REST API for account management.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures
//! - **[`extract`]**: Extractors that keep rejections in the `{"error": ...}` shape
//!
//! # API Structure
//!
//! Everything resource-shaped lives under `/api`:
//!
//! - **Users** (`/api/users/*`): account members and ownership transfer
//! - **Subscriptions** (`/api/subscriptions/*`): service lines and data allowances
//! - **Orders** (`/api/orders/*`): hardware orders with line items and tracking
//! - **Invoices** (`/api/invoices/*`): billing documents
//! - **Devices** (`/api/devices/*`): terminals and routers, plus their telemetry
//! - **Billing info** (`/api/billing-info/*`): stored payment details and credits
//!
//! `/health` and `/` sit outside the prefix. OpenAPI documentation is served at `/docs`.

pub mod extract;
pub mod handlers;
pub mod models;
