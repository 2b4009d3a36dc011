//! Cart orchestration.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use domain::{Cart, CartItem, Money, OrderError};
use futures_util::future::join_all;
use serde::Serialize;
use store::{CartStore, CatalogLookup, ProductCache, ProductSnapshot};

use crate::context::RequestContext;
use crate::error::{Result, ServiceError};
use crate::pricing::ProductPriceResolver;
use crate::settings::ServiceSettings;

/// One cart line priced against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl PricedCartItem {
    fn new(item: &CartItem, product: ProductSnapshot) -> std::result::Result<Self, OrderError> {
        let total_price = product
            .price
            .checked_multiply(item.quantity)
            .ok_or(OrderError::AmountOverflow)?;
        Ok(Self {
            product_id: item.product_id.clone(),
            product_name: product.name,
            quantity: item.quantity,
            unit_price: product.price,
            total_price,
        })
    }
}

/// The cart as shown to its owner.
///
/// Only items that resolved to an active product appear. The stored cart may
/// hold more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub user_id: UserId,
    pub items: Vec<PricedCartItem>,
    pub total_amount: Money,
    pub updated_at: DateTime<Utc>,
}

impl PricedCart {
    fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total_amount: Money::zero(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Loads, mutates and prices carts.
#[derive(Clone)]
pub struct CartService<CS, PC, L>
where
    CS: CartStore,
    PC: ProductCache,
    L: CatalogLookup,
{
    carts: CS,
    resolver: ProductPriceResolver<PC, L>,
    settings: ServiceSettings,
}

impl<CS, PC, L> CartService<CS, PC, L>
where
    CS: CartStore,
    PC: ProductCache,
    L: CatalogLookup,
{
    pub fn new(
        carts: CS,
        resolver: ProductPriceResolver<PC, L>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            carts,
            resolver,
            settings,
        }
    }

    pub fn resolver(&self) -> &ProductPriceResolver<PC, L> {
        &self.resolver
    }

    /// Adds `quantity` of a product, accumulating onto an existing line.
    ///
    /// The product must resolve and be active.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<PricedCart> {
        Self::require_user(user_id)?;
        let mut cart = self.load(ctx, user_id).await?;
        cart.add_item(product_id.clone(), quantity)?;

        let product = self.resolver.resolve(ctx, &product_id).await?;
        if !product.is_available() {
            return Err(ServiceError::ProductUnavailable(product_id));
        }

        let priced = self.enrich(ctx, &cart, Some(&product_id)).await?;
        self.save(ctx, &cart).await?;
        Ok(priced)
    }

    /// Sets a line's quantity. A quantity of zero or less removes the line.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn update_item_quantity(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<PricedCart> {
        Self::require_user(user_id)?;
        let mut cart = self.load(ctx, user_id).await?;
        cart.update_item_quantity(product_id, quantity)?;

        let priced = self.enrich(ctx, &cart, Some(product_id)).await?;
        self.save(ctx, &cart).await?;
        Ok(priced)
    }

    #[tracing::instrument(skip(self, ctx), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<PricedCart> {
        Self::require_user(user_id)?;
        let mut cart = self.load(ctx, user_id).await?;
        cart.remove_item(product_id)?;

        let priced = self.enrich(ctx, &cart, None).await?;
        self.save(ctx, &cart).await?;
        Ok(priced)
    }

    #[tracing::instrument(skip(self, ctx), fields(user_id = %user_id))]
    pub async fn get_cart(&self, ctx: &RequestContext, user_id: &UserId) -> Result<PricedCart> {
        Self::require_user(user_id)?;
        let cart = self.load(ctx, user_id).await?;
        self.enrich(ctx, &cart, None).await
    }

    /// Deletes the stored cart outright.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, ctx: &RequestContext, user_id: &UserId) -> Result<PricedCart> {
        Self::require_user(user_id)?;
        ctx.run(self.carts.delete_by_user_id(user_id)).await?;
        tracing::info!("cart cleared");
        Ok(PricedCart::empty(user_id.clone()))
    }

    fn require_user(user_id: &UserId) -> Result<()> {
        if user_id.is_blank() {
            return Err(ServiceError::InvalidInput("user ID is required".to_string()));
        }
        Ok(())
    }

    async fn load(&self, ctx: &RequestContext, user_id: &UserId) -> Result<Cart> {
        ctx.run(self.carts.get_by_user_id(user_id)).await
    }

    async fn save(&self, ctx: &RequestContext, cart: &Cart) -> Result<()> {
        ctx.run(self.carts.save(cart, self.settings.cart_ttl)).await
    }

    /// Prices every stored line concurrently. Lines that fail to resolve,
    /// resolve to an inactive product or cannot be priced are left out of
    /// the view, except that a `changed` line that cannot be priced fails the
    /// call. Runs before a mutated cart is saved, so a cart whose total would
    /// overflow is never stored.
    async fn enrich(
        &self,
        ctx: &RequestContext,
        cart: &Cart,
        changed: Option<&ProductId>,
    ) -> Result<PricedCart> {
        let lookups = cart
            .items()
            .iter()
            .map(|item| self.resolver.resolve(ctx, &item.product_id));
        let resolved = join_all(lookups).await;

        let mut items = Vec::with_capacity(cart.item_count());
        for (item, result) in cart.items().iter().zip(resolved) {
            match result {
                Ok(product) if product.is_available() => match PricedCartItem::new(item, product) {
                    Ok(priced) => items.push(priced),
                    Err(e) if changed == Some(&item.product_id) => return Err(e.into()),
                    Err(e) => {
                        metrics::counter!("cart_items_dropped_total").increment(1);
                        tracing::debug!(
                            product_id = %item.product_id,
                            error = %e,
                            "dropping unpriceable product from cart view"
                        );
                    }
                },
                Ok(product) => {
                    metrics::counter!("cart_items_dropped_total").increment(1);
                    tracing::debug!(
                        product_id = %item.product_id,
                        status = ?product.status,
                        "dropping unavailable product from cart view"
                    );
                }
                Err(ServiceError::Cancelled) => return Err(ServiceError::Cancelled),
                Err(e) => {
                    metrics::counter!("cart_items_dropped_total").increment(1);
                    tracing::debug!(
                        product_id = %item.product_id,
                        error = %e,
                        "dropping unresolved product from cart view"
                    );
                }
            }
        }

        let total_amount = Money::checked_sum(items.iter().map(|item| item.total_price))
            .ok_or(OrderError::AmountOverflow)?;
        Ok(PricedCart {
            user_id: cart.user_id().clone(),
            items,
            total_amount,
            updated_at: cart.updated_at(),
        })
    }
}
