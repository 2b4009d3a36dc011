use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Availability of a product as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
    Discontinued,
    /// Any status this service does not know about.
    #[serde(other)]
    Unknown,
}

impl ProductStatus {
    /// Only active products can be priced or added to a cart.
    pub fn is_active(&self) -> bool {
        matches!(self, ProductStatus::Active)
    }
}

/// Name, price and availability of a product at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub status: ProductStatus,
}

impl ProductSnapshot {
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        status: ProductStatus,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            status,
        }
    }

    /// Creates a snapshot of an active product.
    pub fn active(product_id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self::new(product_id, name, price, ProductStatus::Active)
    }

    pub fn is_available(&self) -> bool {
        self.status.is_active()
    }
}

/// Advisory cache of product snapshots.
#[async_trait]
pub trait ProductCache: Send + Sync {
    /// Returns the cached snapshot, or `None` on a miss.
    async fn get(&self, product_id: &ProductId) -> Result<Option<ProductSnapshot>>;

    /// Caches a snapshot for `ttl`.
    async fn set(&self, snapshot: &ProductSnapshot, ttl: Duration) -> Result<()>;

    /// Drops a cached snapshot.
    async fn delete(&self, product_id: &ProductId) -> Result<()>;
}

/// Source of truth for product data.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Looks a product up, failing with `NotFound` if the catalog does not
    /// know it.
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductSnapshot>;
}
