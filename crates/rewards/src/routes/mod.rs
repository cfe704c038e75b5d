//! HTTP routes for the rewards service.
//!
//! Three surfaces, mirroring the storefront platform's deployment model:
//!
//! - `/apps/proxy/*` - app-proxy endpoints called by the storefront widget
//!   (the platform appends `shop` and `logged_in_customer_id` query
//!   parameters after authenticating the shopper)
//! - `/webhooks/*` - order event ingestion (signature verification happens
//!   upstream, before requests reach this service)
//! - `/admin/*` - merchant dashboard data
//!
//! The widget calls cross-origin, so the proxy routes carry a permissive
//! CORS layer.

pub mod admin;
pub mod proxy;
pub mod webhooks;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let proxy = Router::new()
        .route("/customer/summary", get(proxy::customer_summary))
        .route("/customer/redeem", post(proxy::redeem))
        .layer(cors);

    Router::new()
        .route("/health", get(health))
        .nest("/apps/proxy", proxy)
        .route("/webhooks/orders/paid", post(webhooks::orders_paid))
        .route("/admin/stats", get(admin::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}
