//! Customer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Address, Order, OrderItem, PaymentDetails};
use serde::{Deserialize, Serialize};
use store::{OrderPage, OrderStore};

use super::{AppState, PageQuery, parse_order_id};
use crate::error::ApiError;
use crate::identity::Caller;

// -- Request types --

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct PlaceOrderRequest {
    pub shipping_address: Address,
    pub billing_address: Address,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_details: PaymentDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id().to_string(),
            product_name: item.product_name().to_string(),
            quantity: item.quantity(),
            unit_price_cents: item.unit_price().cents(),
            total_price_cents: item.total_price().cents(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()).unwrap_or_default(),
            user_id: order.user_id().to_string(),
            status: order.status().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total_cents: order.total_amount().cents(),
            shipping_address: order.shipping_address().clone(),
            billing_address: order.billing_address().clone(),
            payment_details: order.payment_details().clone(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            version: order.version().as_i64(),
        }
    }
}

impl From<OrderPage> for OrderListResponse {
    fn from(page: OrderPage) -> Self {
        Self {
            orders: page.orders.iter().map(OrderResponse::from).collect(),
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order from the caller's cart.
///
/// An empty body places the order with blank addresses.
#[tracing::instrument(skip(state, req))]
pub async fn place<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    req: Option<Json<PlaceOrderRequest>>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let order = state
        .orders
        .place_order(
            &state.context(),
            &caller.user_id,
            req.shipping_address,
            req.billing_address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders — the caller's orders, newest first by default.
#[tracing::instrument(skip(state))]
pub async fn list<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let page = state
        .orders
        .list_user_orders(&state.context(), &caller.user_id, query.pagination())
        .await?;
    Ok(Json(page.into()))
}

/// GET /orders/{id} — one order, visible to its owner or an admin.
#[tracing::instrument(skip(state))]
pub async fn get<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .get_order_by_id(&state.context(), order_id, &caller.user_id, caller.is_admin)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel — cancel one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn cancel<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .cancel_user_order(&state.context(), order_id, &caller.user_id)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
