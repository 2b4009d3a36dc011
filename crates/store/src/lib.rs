//! Persistence and messaging ports for the cart and order services.
//!
//! This crate provides:
//! - `OrderStore` with optimistic concurrency on `(id, version)`
//! - `CartStore` with sliding expiry
//! - `ProductCache` and `CatalogLookup` for price resolution
//! - `EventPublisher` for integration events
//! - In-memory adapters for all of the above, a PostgreSQL order store and a
//!   publisher that only logs

pub mod cart;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod publisher;

pub use cart::CartStore;
pub use error::{Result, StoreError};
pub use memory::{
    InMemoryCartStore, InMemoryCatalog, InMemoryEventPublisher, InMemoryOrderStore,
    InMemoryProductCache, PublishedMessage,
};
pub use order::{OrderFilter, OrderPage, OrderStore, Pagination, SortField, SortOrder};
pub use postgres::PostgresOrderStore;
pub use product::{CatalogLookup, ProductCache, ProductSnapshot, ProductStatus};
pub use publisher::{EventPublisher, EventPublisherExt, LoggingEventPublisher};
