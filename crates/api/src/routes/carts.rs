//! Cart endpoints. Every route acts on the caller's own cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use services::{PricedCart, PricedCartItem};
use store::OrderStore;

use super::AppState;
use crate::error::ApiError;
use crate::identity::Caller;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_quantity: u32,
    pub total_cents: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl From<&PricedCartItem> for CartItemResponse {
    fn from(item: &PricedCartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            total_price_cents: item.total_price.cents(),
        }
    }
}

impl From<PricedCart> for CartResponse {
    fn from(cart: PricedCart) -> Self {
        Self {
            user_id: cart.user_id.to_string(),
            items: cart.items.iter().map(CartItemResponse::from).collect(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total_amount.cents(),
            updated_at: cart.updated_at,
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's priced cart.
#[tracing::instrument(skip(state))]
pub async fn get<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .get_cart(&state.context(), &caller.user_id)
        .await?;
    Ok(Json(cart.into()))
}

/// POST /cart/items — add a product to the cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let quantity = u32::try_from(req.quantity)
        .map_err(|_| ApiError::BadRequest(format!("Invalid quantity: {}", req.quantity)))?;

    let cart = state
        .carts
        .add_item(
            &state.context(),
            &caller.user_id,
            ProductId::new(req.product_id),
            quantity,
        )
        .await?;
    Ok(Json(cart.into()))
}

/// PUT /cart/items/{product_id} — set a line's quantity; zero or less removes it.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .update_item_quantity(
            &state.context(),
            &caller.user_id,
            &ProductId::new(product_id),
            req.quantity,
        )
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart/items/{product_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_item(&state.context(), &caller.user_id, &ProductId::new(product_id))
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart — drop the stored cart.
#[tracing::instrument(skip(state))]
pub async fn clear<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
    caller: Caller,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .clear_cart(&state.context(), &caller.user_id)
        .await?;
    Ok(Json(cart.into()))
}
