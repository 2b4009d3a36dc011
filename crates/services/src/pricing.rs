//! Cache-aside product resolution.

use std::time::Duration;

use common::ProductId;
use store::{CatalogLookup, ProductCache, ProductSnapshot};

use crate::context::RequestContext;
use crate::error::{Result, ServiceError};

/// Resolves product name, price and availability, reading through the
/// product cache to the catalog.
///
/// The cache is advisory: read errors are treated as misses and write errors
/// are logged and ignored. Only the catalog can fail a resolution.
#[derive(Clone)]
pub struct ProductPriceResolver<C, L>
where
    C: ProductCache,
    L: CatalogLookup,
{
    cache: C,
    catalog: L,
    cache_ttl: Duration,
}

impl<C, L> ProductPriceResolver<C, L>
where
    C: ProductCache,
    L: CatalogLookup,
{
    pub fn new(cache: C, catalog: L, cache_ttl: Duration) -> Self {
        Self {
            cache,
            catalog,
            cache_ttl,
        }
    }

    /// Resolves one product.
    #[tracing::instrument(skip(self, ctx), fields(product_id = %product_id))]
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        product_id: &ProductId,
    ) -> Result<ProductSnapshot> {
        match ctx.run(self.cache.get(product_id)).await {
            Ok(Some(snapshot)) => {
                metrics::counter!("product_cache_hits_total").increment(1);
                return Ok(snapshot);
            }
            Ok(None) => {
                tracing::debug!("product cache miss");
            }
            Err(ServiceError::Cancelled) => return Err(ServiceError::Cancelled),
            Err(e) => {
                tracing::debug!(error = %e, "product cache read failed, treating as miss");
            }
        }
        metrics::counter!("product_cache_misses_total").increment(1);

        let snapshot = ctx.run(self.catalog.get_product(product_id)).await?;

        if let Err(e) = ctx.run(self.cache.set(&snapshot, self.cache_ttl)).await {
            metrics::counter!("product_cache_write_failures_total").increment(1);
            tracing::warn!(error = %e, "failed to cache product snapshot");
        }

        Ok(snapshot)
    }

    /// Drops the cached snapshot so the next resolution reads the catalog.
    #[tracing::instrument(skip(self, ctx), fields(product_id = %product_id))]
    pub async fn invalidate(&self, ctx: &RequestContext, product_id: &ProductId) -> Result<()> {
        ctx.run(self.cache.delete(product_id)).await?;
        tracing::info!("product cache entry invalidated");
        Ok(())
    }
}
