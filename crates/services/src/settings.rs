use std::time::Duration;

/// Tunables shared by the cart and order services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Sliding expiry applied to a cart on every write.
    pub cart_ttl: Duration,

    /// How long a resolved product snapshot stays cached.
    pub product_cache_ttl: Duration,
}

impl ServiceSettings {
    pub const DEFAULT_CART_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    pub const DEFAULT_PRODUCT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cart_ttl: Self::DEFAULT_CART_TTL,
            product_cache_ttl: Self::DEFAULT_PRODUCT_CACHE_TTL,
        }
    }
}
