//! HTTP handlers and their request/response bodies.

pub mod admin;
pub mod carts;
pub mod orders;
pub mod system;

use std::str::FromStr;
use std::time::Duration;

use common::OrderId;
use domain::OrderStatus;
use serde::Deserialize;
use services::{CartService, OrderService, RequestContext};
use store::{
    InMemoryCartStore, InMemoryCatalog, InMemoryProductCache, LoggingEventPublisher, OrderStore,
    Pagination, SortField, SortOrder,
};

use crate::error::ApiError;

pub type AppCartService = CartService<InMemoryCartStore, InMemoryProductCache, InMemoryCatalog>;

pub type AppOrderService<O> = OrderService<
    O,
    LoggingEventPublisher,
    InMemoryCartStore,
    InMemoryProductCache,
    InMemoryCatalog,
>;

/// Shared application state accessible from all handlers.
pub struct AppState<O: OrderStore> {
    pub carts: AppCartService,
    pub orders: AppOrderService<O>,
    /// Product catalog, managed through the admin API.
    pub catalog: InMemoryCatalog,
    pub request_timeout: Duration,
    /// Backend name reported by the health check.
    pub order_store_kind: &'static str,
}

impl<O: OrderStore> AppState<O> {
    /// Starts the deadline for one request.
    pub fn context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

/// Paging and sorting query parameters shared by the listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(Pagination::DEFAULT_PAGE_SIZE),
        )
        .sorted_by(
            self.sort_by.unwrap_or_default(),
            self.sort_order.unwrap_or_default(),
        )
    }
}

pub(crate) fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::from_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

pub(crate) fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    OrderStatus::from_str(raw.trim()).map_err(|e| ApiError::BadRequest(e.to_string()))
}
