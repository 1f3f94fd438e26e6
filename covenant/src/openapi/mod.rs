//! OpenAPI documentation for the account API at `/api/*`.
//!
//! The document is served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.
//! Health and index routes are operational endpoints and are left out.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api", description = "Account API")
    ),
    paths(
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_owner,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::users::transfer_ownership,
        api::handlers::subscriptions::list_subscriptions,
        api::handlers::subscriptions::create_subscription,
        api::handlers::subscriptions::get_subscription,
        api::handlers::subscriptions::update_subscription,
        api::handlers::subscriptions::delete_subscription,
        api::handlers::orders::list_orders,
        api::handlers::orders::create_order,
        api::handlers::orders::get_order,
        api::handlers::orders::update_order,
        api::handlers::orders::delete_order,
        api::handlers::invoices::list_invoices,
        api::handlers::invoices::create_invoice,
        api::handlers::invoices::get_invoice,
        api::handlers::invoices::update_invoice,
        api::handlers::invoices::delete_invoice,
        api::handlers::devices::list_devices,
        api::handlers::devices::create_device,
        api::handlers::devices::get_device,
        api::handlers::devices::update_device,
        api::handlers::devices::delete_device,
        api::handlers::device_metrics::list_device_metrics,
        api::handlers::device_metrics::record_device_metric,
        api::handlers::billing::list_billing_info,
        api::handlers::billing::create_billing_info,
        api::handlers::billing::get_billing_info,
        api::handlers::billing::update_billing_info,
        api::handlers::billing::delete_billing_info,
    ),
    components(
        schemas(
            api::models::responses::ErrorResponse,
            api::models::responses::MessageResponse,
            api::models::users::Role,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::subscriptions::SubscriptionStatus,
            api::models::subscriptions::SubscriptionCreate,
            api::models::subscriptions::SubscriptionUpdate,
            api::models::subscriptions::SubscriptionResponse,
            api::models::orders::OrderStatus,
            api::models::orders::OrderItem,
            api::models::orders::OrderCreate,
            api::models::orders::OrderUpdate,
            api::models::orders::OrderResponse,
            api::models::invoices::InvoiceStatus,
            api::models::invoices::InvoiceCreate,
            api::models::invoices::InvoiceUpdate,
            api::models::invoices::InvoiceResponse,
            api::models::devices::DeviceStatus,
            api::models::devices::DeviceCreate,
            api::models::devices::DeviceUpdate,
            api::models::devices::DeviceResponse,
            api::models::device_metrics::MetricType,
            api::models::device_metrics::DeviceMetricCreate,
            api::models::device_metrics::DeviceMetricResponse,
            api::models::billing::CardType,
            api::models::billing::BillingInfoCreate,
            api::models::billing::BillingInfoUpdate,
            api::models::billing::BillingInfoResponse,
        )
    ),
    tags(
        (name = "users", description = "Account members. The first user created becomes the account owner; \
ownership can be transferred but the owner cannot be deleted while other users remain."),
        (name = "subscriptions", description = "Service plans attached to a user, with billing amounts and service addresses."),
        (name = "orders", description = "Hardware and service orders with line items and shipping state."),
        (name = "invoices", description = "Billing documents. Deleting a subscription keeps its invoices and clears the link."),
        (name = "devices", description = "Terminals and routers, plus their time-series telemetry."),
        (name = "billing", description = "Stored payment card summaries and credit balances."),
    ),
    info(
        title = "Covenant API",
        version = "1.0.0",
        description = "Account management for satellite internet customers.

## Errors

Every error response carries a single `error` field:

```json
{ \"error\": \"Subscription with ID 3f0c... not found\" }
```

Validation problems and dangling references return `400`, unknown IDs `404`, duplicate numbers or emails `409`.",
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn test_every_resource_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/users",
            "/users/profile/owner",
            "/users/{user_id}",
            "/users/{user_id}/owner",
            "/subscriptions/{subscription_id}",
            "/orders/{order_id}",
            "/invoices/{invoice_id}",
            "/devices/{device_id}",
            "/devices/{device_id}/metrics",
            "/billing-info/{billing_info_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.servers.as_ref().map(|s| s[0].url.as_str()), Some("/api"));
    }

    #[test]
    fn test_id_filters_are_documented_as_uuid_strings() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        for (path, name) in [
            ("/subscriptions", "user_id"),
            ("/orders", "user_id"),
            ("/invoices", "subscription_id"),
            ("/devices", "subscription_id"),
            ("/billing-info", "user_id"),
        ] {
            let params = doc["paths"][path]["get"]["parameters"].as_array().unwrap();
            let param = params.iter().find(|p| p["name"] == name).unwrap();
            assert_eq!(param["in"], "query", "{path} {name}");
            assert_eq!(param["schema"]["format"], "uuid", "{path} {name}");
        }
    }
}
