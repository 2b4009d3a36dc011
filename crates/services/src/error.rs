//! Service error types.

use common::{OrderId, ProductId, Version};
use domain::{CartError, OrderError, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors returned by the cart and order services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The order or product does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller may not see or change the resource.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// No priced item is left in the cart to order.
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Item not found in cart: {0}")]
    ItemNotFound(ProductId),

    /// The state machine does not allow the requested status change.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order is past the point where it can be cancelled.
    #[error("Order cannot be cancelled in status {status}")]
    CancellationNotAllowed { status: OrderStatus },

    /// Another write changed the order after it was read.
    #[error("Order {order_id} was modified concurrently: expected version {expected}, found {actual}")]
    OptimisticLockConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// A store, cache or catalog call failed for infrastructure reasons.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Malformed quantity, price or identifier.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The product exists but is not active.
    #[error("Product is not available: {0}")]
    ProductUnavailable(ProductId),

    /// The request deadline passed before the work finished.
    #[error("Request cancelled: deadline exceeded")]
    Cancelled,

    /// A stored value could not be interpreted.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::VersionConflict {
                order_id,
                expected,
                actual,
            } => ServiceError::OptimisticLockConflict {
                order_id,
                expected,
                actual,
            },
            StoreError::CorruptRecord(msg) => ServiceError::DataIntegrity(msg),
            StoreError::Serialization(e) => ServiceError::DataIntegrity(e.to_string()),
            StoreError::Unavailable(msg) => ServiceError::UpstreamUnavailable(msg),
            StoreError::Database(e) => ServiceError::UpstreamUnavailable(e.to_string()),
            StoreError::Migration(e) => ServiceError::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { from, to } => {
                ServiceError::InvalidTransition { from, to }
            }
            OrderError::CannotCancel { status } => ServiceError::CancellationNotAllowed { status },
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<CartError> for ServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotFound { product_id } => ServiceError::ItemNotFound(product_id),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}
