//! HTTP API server for the cart and order services.
//!
//! Provides REST endpoints for carts, orders and order administration, with
//! structured logging (tracing) and Prometheus metrics. Caller identity comes
//! from headers set by the upstream identity gateway.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use services::{CartService, OrderService, ProductPriceResolver};
use store::{
    InMemoryCartStore, InMemoryCatalog, InMemoryProductCache, LoggingEventPublisher, OrderStore,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, ConfigError};
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<O: OrderStore + 'static>(
    state: Arc<AppState<O>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<O>))
        .route(
            "/cart",
            get(routes::carts::get::<O>).delete(routes::carts::clear::<O>),
        )
        .route("/cart/items", post(routes::carts::add_item::<O>))
        .route(
            "/cart/items/{product_id}",
            put(routes::carts::update_item::<O>).delete(routes::carts::remove_item::<O>),
        )
        .route(
            "/orders",
            post(routes::orders::place::<O>).get(routes::orders::list::<O>),
        )
        .route("/orders/{id}", get(routes::orders::get::<O>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<O>))
        .route("/admin/orders", get(routes::admin::list::<O>))
        .route(
            "/admin/orders/{id}/status",
            put(routes::admin::update_status::<O>),
        )
        .route(
            "/admin/orders/{id}/payment",
            post(routes::admin::record_payment::<O>),
        )
        .route("/admin/products/{id}", put(routes::admin::upsert_product::<O>))
        .route(
            "/admin/products/{id}/cache",
            delete(routes::admin::invalidate_product::<O>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around an order store, with in-memory
/// carts and product cache, a catalog loaded from the configured catalog
/// file, and events written to the log.
pub fn create_default_state<O: OrderStore + 'static>(
    order_store: O,
    order_store_kind: &'static str,
    config: &Config,
) -> Result<Arc<AppState<O>>, ConfigError> {
    let settings = config.service_settings();
    let products = config.load_catalog()?;
    if products.is_empty() {
        tracing::warn!("catalog is empty, products must be added through the admin API");
    } else {
        tracing::info!(products = products.len(), "catalog loaded");
    }
    let catalog = InMemoryCatalog::with_products(products);

    let resolver = ProductPriceResolver::new(
        InMemoryProductCache::new(),
        catalog.clone(),
        settings.product_cache_ttl,
    );
    let carts = CartService::new(InMemoryCartStore::new(), resolver, settings);
    let orders = OrderService::new(order_store, LoggingEventPublisher::new(), carts.clone());

    Ok(Arc::new(AppState {
        carts,
        orders,
        catalog,
        request_timeout: config.request_timeout,
        order_store_kind,
    }))
}
