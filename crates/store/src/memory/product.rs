use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use super::expiring::ExpiringMap;
use crate::product::{CatalogLookup, ProductCache, ProductSnapshot};
use crate::{Result, StoreError};

/// In-memory product cache with per-entry expiry. Expired entries are
/// dropped by later writes.
#[derive(Clone, Default)]
pub struct InMemoryProductCache {
    entries: Arc<RwLock<ExpiringMap<ProductId, ProductSnapshot>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an unexpired entry exists for the product.
    pub async fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.read().await.get(product_id).is_some()
    }

    /// Returns the number of entries held, including expired ones not yet
    /// swept.
    pub async fn stored_count(&self) -> usize {
        self.entries.read().await.stored_count()
    }

    /// Seeds an entry directly, bypassing the failure toggles.
    pub async fn insert(&self, snapshot: ProductSnapshot, ttl: Duration) {
        self.entries
            .write()
            .await
            .insert(snapshot.product_id.clone(), snapshot, ttl);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductCache for InMemoryProductCache {
    async fn get(&self, product_id: &ProductId) -> Result<Option<ProductSnapshot>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("product cache offline".to_string()));
        }

        Ok(self.entries.read().await.get(product_id).cloned())
    }

    async fn set(&self, snapshot: &ProductSnapshot, ttl: Duration) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("product cache offline".to_string()));
        }

        self.insert(snapshot.clone(), ttl).await;
        Ok(())
    }

    async fn delete(&self, product_id: &ProductId) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("product cache offline".to_string()));
        }

        self.entries.write().await.remove(product_id);
        Ok(())
    }
}

/// In-memory product catalog.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, ProductSnapshot>>>,
    unavailable: Arc<AtomicBool>,
    lookups: Arc<AtomicUsize>,
    latency: Arc<RwLock<Option<Duration>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = ProductSnapshot>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.product_id.clone(), p))
            .collect();
        Self {
            products: Arc::new(RwLock::new(products)),
            ..Self::default()
        }
    }

    /// Number of products held.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Adds or replaces a product.
    pub async fn upsert(&self, snapshot: ProductSnapshot) {
        self.products
            .write()
            .await
            .insert(snapshot.product_id.clone(), snapshot);
    }

    pub async fn remove(&self, product_id: &ProductId) {
        self.products.write().await.remove(product_id);
    }

    /// Number of `get_product` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delays every lookup by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductSnapshot> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }

        self.products
            .read()
            .await
            .get(product_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))
    }
}
