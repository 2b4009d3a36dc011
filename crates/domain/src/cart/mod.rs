//! Cart aggregate.

mod aggregate;

pub use aggregate::{Cart, CartItem};

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Product ID is empty.
    #[error("Product ID is required")]
    EmptyProductId,

    /// Quantity to add must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Item not found in cart.
    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: ProductId },
}
