//! Identifier types shared across the cart and order crates.

pub mod types;

pub use types::{OrderId, ProductId, UserId, Version};
