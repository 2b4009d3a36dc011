use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use domain::Cart;

use crate::Result;

/// Persistence port for carts.
///
/// Carts are short-lived key-value records with a sliding expiry. Writes are
/// last-write-wins.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads a user's cart. A missing or expired cart is returned as an empty
    /// cart, never as `NotFound`.
    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Cart>;

    /// Stores the cart and resets its expiry to `ttl` from now.
    async fn save(&self, cart: &Cart, ttl: Duration) -> Result<()>;

    /// Removes the user's cart. Removing a missing cart succeeds.
    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<()>;
}
