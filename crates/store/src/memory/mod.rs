//! In-memory adapters, used by tests and when no database is configured.

mod cart;
mod expiring;
mod order;
mod product;
mod publisher;

pub use cart::InMemoryCartStore;
pub use order::InMemoryOrderStore;
pub use product::{InMemoryCatalog, InMemoryProductCache};
pub use publisher::{InMemoryEventPublisher, PublishedMessage};
