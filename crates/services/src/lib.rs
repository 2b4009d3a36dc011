//! Orchestration layer for carts and orders.
//!
//! This crate provides:
//! - `ProductPriceResolver`: cache-aside product lookup
//! - `CartService`: cart mutations returning a priced cart view
//! - `OrderService`: order placement and version-checked status changes
//!
//! Every operation takes a `RequestContext` whose deadline bounds each
//! store, cache and catalog call.

pub mod cart;
pub mod context;
pub mod error;
pub mod order;
pub mod pricing;
pub mod settings;

pub use cart::{CartService, PricedCart, PricedCartItem};
pub use context::RequestContext;
pub use error::{Result, ServiceError};
pub use order::OrderService;
pub use pricing::ProductPriceResolver;
pub use settings::ServiceSettings;
