use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, Version};
use domain::{Order, OrderParts, OrderStatus, PaymentDetails};
use tokio::sync::RwLock;

use crate::order::{OrderFilter, OrderPage, OrderStore, SortField, SortOrder, draft_parts};
use crate::{Result, StoreError};

/// In-memory order store.
///
/// Applies the same `(id, version)` matching as the PostgreSQL store under a
/// single write lock.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, OrderParts>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order store offline".to_string()));
        }
        Ok(())
    }

    /// Runs `apply` on the stored record if it is at `expected_version`, then
    /// bumps the version.
    async fn conditional_update<F>(
        &self,
        id: OrderId,
        expected_version: Version,
        apply: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut OrderParts) + Send,
    {
        self.check_available()?;

        let mut orders = self.orders.write().await;
        let parts = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;

        if parts.version != expected_version {
            return Err(StoreError::VersionConflict {
                order_id: id,
                expected: expected_version,
                actual: parts.version,
            });
        }

        apply(parts);
        parts.version = parts.version.next();
        parts.updated_at = Utc::now();
        Ok(())
    }
}

fn compare(a: &Order, b: &Order, field: SortField) -> std::cmp::Ordering {
    match field {
        SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        SortField::TotalAmount => a.total_amount().cmp(&b.total_amount()),
        SortField::Status => a.status().as_str().cmp(b.status().as_str()),
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, draft: &Order) -> Result<OrderId> {
        self.check_available()?;

        let id = OrderId::new();
        self.orders.write().await.insert(id, draft_parts(id, draft));
        Ok(id)
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        self.check_available()?;

        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .map(Order::from_parts)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
        expected_version: Version,
    ) -> Result<()> {
        self.conditional_update(id, expected_version, |parts| {
            parts.status = new_status;
        })
        .await
    }

    async fn update_payment_details(
        &self,
        id: OrderId,
        details: &PaymentDetails,
        new_status: Option<OrderStatus>,
        expected_version: Version,
    ) -> Result<()> {
        let details = details.clone();
        self.conditional_update(id, expected_version, move |parts| {
            parts.payment_details = details;
            if let Some(status) = new_status {
                parts.status = status;
            }
        })
        .await
    }

    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage> {
        self.check_available()?;

        let mut matching: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .cloned()
            .map(Order::from_parts)
            .filter(|order| filter.matches(order))
            .collect();

        let pagination = filter.pagination;
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, pagination.sort_by);
            let ordering = match pagination.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| {
                let a_id = a.id().map(|id| id.as_uuid());
                a_id.cmp(&b.id().map(|id| id.as_uuid()))
            })
        });

        let total_count = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();

        Ok(OrderPage {
            orders: page,
            total_count,
            page: pagination.page,
            page_size: pagination.page_size,
        })
    }
}
