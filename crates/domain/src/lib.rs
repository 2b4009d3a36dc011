//! Domain layer for the cart and order services.
//!
//! This crate provides:
//! - Order aggregate with the status state machine
//! - Cart aggregate with per-item quantity rules
//! - Integration events announced after order writes

pub mod cart;
pub mod order;

pub use cart::{Cart, CartError, CartItem};
pub use common::{OrderId, ProductId, UserId, Version};
pub use order::{
    Address, Money, ORDER_CREATED_TOPIC, ORDER_STATUS_CHANGED_TOPIC, Order, OrderCreatedData,
    OrderError, OrderEvent, OrderItem, OrderParts, OrderStatus, OrderStatusChangedData,
    PaymentDetails,
};
