//! Order aggregate and related types.

mod aggregate;
mod events;
mod status;
mod value_objects;

pub use aggregate::{Order, OrderParts};
pub use events::{
    ORDER_CREATED_TOPIC, ORDER_STATUS_CHANGED_TOPIC, OrderCreatedData, OrderEvent,
    OrderStatusChangedData,
};
pub use status::OrderStatus;
pub use value_objects::{Address, Money, OrderItem, PaymentDetails};

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// User ID is required.
    #[error("User ID is required")]
    UserIdRequired,

    /// The requested status change is not part of the lifecycle.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order is past the point where it can be cancelled.
    #[error("Order cannot be cancelled in {status} status")]
    CannotCancel { status: OrderStatus },

    /// Product ID is empty.
    #[error("Product ID is required")]
    EmptyProductId,

    /// Product name is empty.
    #[error("Product name is required for {product_id}")]
    EmptyProductName { product_id: ProductId },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must not be negative)")]
    InvalidPrice { price: i64 },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Supplied total does not match the items.
    #[error("Order total mismatch: items sum to {expected}, got {actual}")]
    TotalMismatch { expected: Money, actual: Money },

    /// An amount does not fit in cents.
    #[error("Amount is too large")]
    AmountOverflow,

    /// A stored status name is not recognized.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
