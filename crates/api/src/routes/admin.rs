//! Admin endpoints. Every route requires the admin role.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ProductId, UserId};
use domain::{Money, PaymentDetails};
use serde::{Deserialize, Serialize};
use store::{OrderFilter, OrderStore, ProductSnapshot, ProductStatus, SortField, SortOrder};

use super::orders::{OrderListResponse, OrderResponse};
use super::{AppState, PageQuery, parse_order_id, parse_status};
use crate::error::ApiError;
use crate::identity::Admin;

// -- Request types --

#[derive(Debug, Deserialize, Default)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub status: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct RecordPaymentRequest {
    #[serde(default)]
    pub payment_details: PaymentDetails,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpsertProductRequest {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub status: ProductStatus,
}

impl From<&ProductSnapshot> for ProductResponse {
    fn from(product: &ProductSnapshot) -> Self {
        Self {
            product_id: product.product_id.to_string(),
            name: product.name.clone(),
            price_cents: product.price.cents(),
            status: product.status,
        }
    }
}

// -- Handlers --

/// GET /admin/orders — all orders, optionally filtered by status or user.
#[tracing::instrument(skip(state))]
pub async fn list<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    Admin(admin_id): Admin,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let mut filters = OrderFilter::new();
    if let Some(ref status) = query.status {
        filters = filters.status(parse_status(status)?);
    }
    if let Some(ref user_id) = query.user_id
        && !user_id.trim().is_empty()
    {
        filters = filters.user_id(UserId::new(user_id.trim()));
    }

    let pagination = PageQuery {
        page: query.page,
        page_size: query.page_size,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    }
    .pagination();

    let page = state
        .orders
        .list_all_orders_admin(&state.context(), &admin_id, pagination, filters)
        .await?;
    Ok(Json(page.into()))
}

/// PUT /admin/orders/{id}/status — move an order to any allowed status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    Admin(admin_id): Admin,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = parse_status(&req.status)?;

    let order = state
        .orders
        .update_order_status_by_admin(&state.context(), order_id, status, &admin_id)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /admin/orders/{id}/payment — record payment details and optionally
/// a status change.
#[tracing::instrument(skip(state, req))]
pub async fn record_payment<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    Admin(admin_id): Admin,
    Path(id): Path<String>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = req.status.as_deref().map(parse_status).transpose()?;

    let order = state
        .orders
        .record_payment(
            &state.context(),
            order_id,
            req.payment_details,
            status,
            &admin_id,
        )
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /admin/products/{id} — add or replace a catalog product.
///
/// Cached snapshots of the product are left alone; they refresh when they
/// expire or are invalidated.
#[tracing::instrument(skip(state, req))]
pub async fn upsert_product<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    Admin(_admin_id): Admin,
    Path(product_id): Path<String>,
    Json(req): Json<UpsertProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::new(product_id);
    if product_id.is_blank() {
        return Err(ApiError::BadRequest("product id is required".to_string()));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("product name is required".to_string()));
    }
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(format!(
            "price must not be negative, got {}",
            req.price_cents
        )));
    }

    let product = ProductSnapshot::new(
        product_id,
        req.name.trim(),
        Money::from_cents(req.price_cents),
        req.status.unwrap_or(ProductStatus::Active),
    );
    state.catalog.upsert(product.clone()).await;
    tracing::info!(product_id = %product.product_id, "catalog product saved");
    Ok(Json(ProductResponse::from(&product)))
}

/// DELETE /admin/products/{id}/cache — evict a product from the cache.
#[tracing::instrument(skip(state))]
pub async fn invalidate_product<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    Admin(_admin_id): Admin,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .carts
        .resolver()
        .invalidate(&state.context(), &ProductId::new(product_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
