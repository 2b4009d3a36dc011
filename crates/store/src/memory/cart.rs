use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use domain::Cart;
use tokio::sync::RwLock;

use super::expiring::ExpiringMap;
use crate::cart::CartStore;
use crate::{Result, StoreError};

/// In-memory cart store with per-cart expiry.
///
/// Expiry is measured on the tokio clock, so paused-time tests can advance
/// past it. Expired carts are dropped by later writes.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<ExpiringMap<UserId, Cart>>>,
    unavailable: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of unexpired carts.
    pub async fn cart_count(&self) -> usize {
        self.carts.read().await.live_count()
    }

    /// Returns the number of carts held, including expired ones not yet
    /// swept.
    pub async fn stored_count(&self) -> usize {
        self.carts.read().await.stored_count()
    }

    /// Returns how long the user's cart has left to live.
    pub async fn ttl_remaining(&self, user_id: &UserId) -> Option<Duration> {
        self.carts.read().await.ttl_remaining(user_id)
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes only `delete_by_user_id` fail while set.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cart store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Cart> {
        self.check_available()?;

        let cart = self
            .carts
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Cart::new(user_id.clone()));
        Ok(cart)
    }

    async fn save(&self, cart: &Cart, ttl: Duration) -> Result<()> {
        self.check_available()?;

        self.carts
            .write()
            .await
            .insert(cart.user_id().clone(), cart.clone(), ttl);
        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<()> {
        self.check_available()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cart delete rejected".to_string()));
        }

        self.carts.write().await.remove(user_id);
        Ok(())
    }
}
