//! Integration tests for cart-to-order placement and the order lifecycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId, Version};
use domain::{
    Address, Money, ORDER_CREATED_TOPIC, ORDER_STATUS_CHANGED_TOPIC, Order, OrderStatus,
    PaymentDetails,
};
use services::{
    CartService, OrderService, ProductPriceResolver, RequestContext, ServiceError,
    ServiceSettings,
};
use store::{
    InMemoryCartStore, InMemoryCatalog, InMemoryEventPublisher, InMemoryOrderStore,
    InMemoryProductCache, OrderFilter, OrderPage, OrderStore, Pagination, ProductSnapshot,
    ProductStatus, StoreError,
};
use tokio::sync::{Barrier, Mutex};

/// Order store that can hold every `get_by_id` after its read until a set
/// number of reads are waiting, so concurrent writers start from the same
/// version.
#[derive(Clone)]
struct LockstepOrderStore {
    inner: InMemoryOrderStore,
    read_barrier: Arc<Mutex<Option<Arc<Barrier>>>>,
}

impl LockstepOrderStore {
    fn new(inner: InMemoryOrderStore) -> Self {
        Self {
            inner,
            read_barrier: Arc::default(),
        }
    }

    async fn sync_reads(&self, parties: usize) {
        *self.read_barrier.lock().await = Some(Arc::new(Barrier::new(parties)));
    }

    async fn clear_read_sync(&self) {
        *self.read_barrier.lock().await = None;
    }
}

#[async_trait]
impl OrderStore for LockstepOrderStore {
    async fn create(&self, draft: &Order) -> Result<OrderId, StoreError> {
        self.inner.create(draft).await
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order, StoreError> {
        let order = self.inner.get_by_id(id).await?;
        let barrier = self.read_barrier.lock().await.clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        Ok(order)
    }

    async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
        expected_version: Version,
    ) -> Result<(), StoreError> {
        self.inner.update_status(id, new_status, expected_version).await
    }

    async fn update_payment_details(
        &self,
        id: OrderId,
        details: &PaymentDetails,
        new_status: Option<OrderStatus>,
        expected_version: Version,
    ) -> Result<(), StoreError> {
        self.inner
            .update_payment_details(id, details, new_status, expected_version)
            .await
    }

    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage, StoreError> {
        self.inner.list(filter).await
    }
}

type TestCartService = CartService<InMemoryCartStore, InMemoryProductCache, InMemoryCatalog>;
type TestOrderService = OrderService<
    LockstepOrderStore,
    InMemoryEventPublisher,
    InMemoryCartStore,
    InMemoryProductCache,
    InMemoryCatalog,
>;

struct TestHarness {
    carts: TestCartService,
    orders: TestOrderService,
    order_store: InMemoryOrderStore,
    lockstep: LockstepOrderStore,
    cart_store: InMemoryCartStore,
    catalog: InMemoryCatalog,
    publisher: InMemoryEventPublisher,
}

impl TestHarness {
    async fn new() -> Self {
        let order_store = InMemoryOrderStore::new();
        let cart_store = InMemoryCartStore::new();
        let catalog = InMemoryCatalog::new();
        let publisher = InMemoryEventPublisher::new();

        catalog
            .upsert(ProductSnapshot::active("p1", "Widget", Money::from_cents(1000)))
            .await;
        catalog
            .upsert(ProductSnapshot::active("p2", "Gadget", Money::from_cents(2000)))
            .await;

        let settings = ServiceSettings::default();
        let resolver = ProductPriceResolver::new(
            InMemoryProductCache::new(),
            catalog.clone(),
            settings.product_cache_ttl,
        );
        let carts = CartService::new(cart_store.clone(), resolver, settings);
        let lockstep = LockstepOrderStore::new(order_store.clone());
        let orders = OrderService::new(lockstep.clone(), publisher.clone(), carts.clone());

        Self {
            carts,
            orders,
            order_store,
            lockstep,
            cart_store,
            catalog,
            publisher,
        }
    }

    /// Fills the standard cart: p1 x2 at $10, p2 x1 at $20.
    async fn fill_cart(&self, user: &UserId) {
        let ctx = RequestContext::background();
        self.carts
            .add_item(&ctx, user, ProductId::new("p1"), 2)
            .await
            .unwrap();
        self.carts
            .add_item(&ctx, user, ProductId::new("p2"), 1)
            .await
            .unwrap();
    }

    async fn place(&self, user: &UserId) -> OrderId {
        self.fill_cart(user).await;
        let order = self
            .orders
            .place_order(
                &RequestContext::background(),
                user,
                shipping(),
                Address::default(),
            )
            .await
            .unwrap();
        order.id().unwrap()
    }

    async fn set_status(&self, order_id: OrderId, path: &[OrderStatus]) {
        let admin = UserId::new("admin");
        for status in path {
            self.orders
                .update_order_status_by_admin(
                    &RequestContext::background(),
                    order_id,
                    *status,
                    &admin,
                )
                .await
                .unwrap();
        }
    }
}

fn shipping() -> Address {
    Address {
        street: Some("1 Main St".to_string()),
        city: Some("Springfield".to_string()),
        postal_code: Some("12345".to_string()),
        country: Some("US".to_string()),
    }
}

fn alice() -> UserId {
    UserId::new("alice")
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn places_order_from_priced_cart() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;

        let order = h
            .orders
            .place_order(&RequestContext::background(), &alice(), shipping(), Address::default())
            .await
            .unwrap();

        assert!(order.id().is_some());
        assert_eq!(order.total_amount(), Money::from_cents(4000));
        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(order.version(), Version::first());
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.shipping_address(), &shipping());

        let stored = h.order_store.get_by_id(order.id().unwrap()).await.unwrap();
        assert_eq!(stored.total_amount(), Money::from_cents(4000));

        let cart = h
            .carts
            .get_cart(&RequestContext::background(), &alice())
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn publishes_order_created() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let events = h.publisher.published_on(ORDER_CREATED_TOPIC).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "OrderCreated");
        assert_eq!(events[0]["data"]["order_id"], order_id.to_string());
        assert_eq!(events[0]["data"]["item_count"], 2);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_store_write() {
        let h = TestHarness::new().await;

        let result = h
            .orders
            .place_order(&RequestContext::background(), &alice(), shipping(), Address::default())
            .await;

        assert!(matches!(result, Err(ServiceError::EmptyCart)));
        assert_eq!(h.order_store.order_count().await, 0);
        assert!(h.publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn fully_unresolved_cart_is_empty() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;
        h.catalog
            .upsert(ProductSnapshot::new(
                "p1",
                "Widget",
                Money::from_cents(1000),
                ProductStatus::OutOfStock,
            ))
            .await;
        h.catalog
            .upsert(ProductSnapshot::new(
                "p2",
                "Gadget",
                Money::from_cents(2000),
                ProductStatus::Inactive,
            ))
            .await;
        let ctx = RequestContext::background();
        for p in ["p1", "p2"] {
            h.carts.resolver().invalidate(&ctx, &ProductId::new(p)).await.unwrap();
        }

        let result = h
            .orders
            .place_order(&ctx, &alice(), shipping(), Address::default())
            .await;

        assert!(matches!(result, Err(ServiceError::EmptyCart)));
        assert_eq!(h.order_store.order_count().await, 0);
    }

    #[tokio::test]
    async fn only_available_items_are_ordered() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;
        h.catalog.remove(&ProductId::new("p2")).await;
        let ctx = RequestContext::background();
        h.carts.resolver().invalidate(&ctx, &ProductId::new("p2")).await.unwrap();

        let order = h
            .orders
            .place_order(&ctx, &alice(), shipping(), Address::default())
            .await
            .unwrap();
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.total_amount(), Money::from_cents(2000));
    }

    #[tokio::test]
    async fn failed_cart_clear_does_not_fail_placement() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;
        h.cart_store.set_fail_deletes(true);

        let order = h
            .orders
            .place_order(&RequestContext::background(), &alice(), shipping(), Address::default())
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(h.order_store.order_count().await, 1);
        assert_eq!(h.cart_store.cart_count().await, 1);
        assert_eq!(h.publisher.published_on(ORDER_CREATED_TOPIC).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_publish_does_not_fail_placement() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;
        h.publisher.set_fail(true);

        let result = h
            .orders
            .place_order(&RequestContext::background(), &alice(), shipping(), Address::default())
            .await;

        assert!(result.is_ok());
        assert_eq!(h.order_store.order_count().await, 1);
        assert_eq!(h.cart_store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn store_outage_propagates() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;
        h.order_store.set_unavailable(true);

        let result = h
            .orders
            .place_order(&RequestContext::background(), &alice(), shipping(), Address::default())
            .await;

        assert!(matches!(result, Err(ServiceError::UpstreamUnavailable(_))));
        assert_eq!(h.cart_store.cart_count().await, 1);
        assert!(h.publisher.published().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_cancels_before_write() {
        let h = TestHarness::new().await;
        h.fill_cart(&alice()).await;
        let ctx = RequestContext::background();
        for p in ["p1", "p2"] {
            h.carts.resolver().invalidate(&ctx, &ProductId::new(p)).await.unwrap();
        }
        h.catalog.set_latency(Some(Duration::from_secs(2))).await;

        let ctx = RequestContext::with_timeout(Duration::from_millis(500));
        let result = h
            .orders
            .place_order(&ctx, &alice(), shipping(), Address::default())
            .await;

        assert!(matches!(result, Err(ServiceError::Cancelled)));
        assert_eq!(h.order_store.order_count().await, 0);
        assert_eq!(h.cart_store.cart_count().await, 1);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn owner_and_admin_can_read() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;
        let ctx = RequestContext::background();

        let order = h
            .orders
            .get_order_by_id(&ctx, order_id, &alice(), false)
            .await
            .unwrap();
        assert_eq!(order.user_id(), &alice());

        let order = h
            .orders
            .get_order_by_id(&ctx, order_id, &UserId::new("admin"), true)
            .await
            .unwrap();
        assert_eq!(order.id(), Some(order_id));
    }

    #[tokio::test]
    async fn other_user_is_denied() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let result = h
            .orders
            .get_order_by_id(&RequestContext::background(), order_id, &UserId::new("bob"), false)
            .await;
        assert!(matches!(result, Err(ServiceError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let h = TestHarness::new().await;
        let result = h
            .orders
            .get_order_by_id(&RequestContext::background(), OrderId::new(), &alice(), true)
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn listings_are_scoped() {
        let h = TestHarness::new().await;
        h.place(&alice()).await;
        h.place(&alice()).await;
        let bobs = h.place(&UserId::new("bob")).await;
        h.set_status(bobs, &[OrderStatus::Paid]).await;
        let ctx = RequestContext::background();

        let page = h
            .orders
            .list_user_orders(&ctx, &alice(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page.orders.iter().all(|o| o.user_id() == &alice()));

        let page = h
            .orders
            .list_all_orders_admin(
                &ctx,
                &UserId::new("admin"),
                Pagination::default(),
                OrderFilter::new(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);

        let page = h
            .orders
            .list_all_orders_admin(
                &ctx,
                &UserId::new("admin"),
                Pagination::new(1, 10),
                OrderFilter::new().status(OrderStatus::Paid),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.orders[0].id(), Some(bobs));
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn owner_cancels_pending_order() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let order = h
            .orders
            .cancel_user_order(&RequestContext::background(), order_id, &alice())
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.version(), Version::new(2));

        let stored = h.order_store.get_by_id(order_id).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_eq!(stored.version(), Version::new(2));

        let events = h.publisher.published_on(ORDER_STATUS_CHANGED_TOPIC).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["data"]["old_status"], "PENDING_PAYMENT");
        assert_eq!(events[0]["data"]["new_status"], "CANCELLED");
        assert_eq!(events[0]["data"]["changed_by"], "alice");
    }

    #[tokio::test]
    async fn non_owner_cannot_cancel() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let result = h
            .orders
            .cancel_user_order(&RequestContext::background(), order_id, &UserId::new("bob"))
            .await;
        assert!(matches!(result, Err(ServiceError::AccessDenied(_))));

        let stored = h.order_store.get_by_id(order_id).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::PendingPayment);
    }

    #[tokio::test]
    async fn delivered_order_cannot_be_cancelled() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;
        h.set_status(
            order_id,
            &[
                OrderStatus::Paid,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ],
        )
        .await;
        let before = h.order_store.get_by_id(order_id).await.unwrap();

        let result = h
            .orders
            .cancel_user_order(&RequestContext::background(), order_id, &alice())
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::CancellationNotAllowed {
                status: OrderStatus::Delivered
            })
        ));
        let after = h.order_store.get_by_id(order_id).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after.version(), Version::new(5));
    }

    #[tokio::test]
    async fn concurrent_cancels_conflict() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;
        h.lockstep.sync_reads(2).await;

        let ctx = RequestContext::background();
        let alice = alice();
        let (first, second) = tokio::join!(
            h.orders.cancel_user_order(&ctx, order_id, &alice),
            h.orders.cancel_user_order(&ctx, order_id, &alice),
        );
        h.lockstep.clear_read_sync().await;

        let results = [first, second];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let conflicted = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(ServiceError::OptimisticLockConflict { expected, actual, .. })
                        if *expected == Version::first() && *actual == Version::new(2)
                )
            })
            .count();
        assert_eq!(succeeded, 1);
        assert_eq!(conflicted, 1);

        let stored = h.order_store.get_by_id(order_id).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_eq!(stored.version(), Version::new(2));
        assert_eq!(h.publisher.published_on(ORDER_STATUS_CHANGED_TOPIC).await.len(), 1);
    }

    #[tokio::test]
    async fn admin_transition_is_validated() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let result = h
            .orders
            .update_order_status_by_admin(
                &RequestContext::background(),
                order_id,
                OrderStatus::Shipped,
                &UserId::new("admin"),
            )
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidTransition {
                from: OrderStatus::PendingPayment,
                to: OrderStatus::Shipped
            })
        ));
        assert_eq!(h.order_store.get_by_id(order_id).await.unwrap().version(), Version::first());
    }

    #[tokio::test]
    async fn admin_can_fail_any_order_and_retry() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;
        h.set_status(
            order_id,
            &[OrderStatus::Paid, OrderStatus::Failed, OrderStatus::PendingPayment],
        )
        .await;

        let stored = h.order_store.get_by_id(order_id).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::PendingPayment);
        assert_eq!(stored.version(), Version::new(4));
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let order = h
            .orders
            .update_order_status_by_admin(
                &RequestContext::background(),
                order_id,
                OrderStatus::PendingPayment,
                &UserId::new("admin"),
            )
            .await
            .unwrap();
        assert_eq!(order.version(), Version::first());
        assert!(h.publisher.published_on(ORDER_STATUS_CHANGED_TOPIC).await.is_empty());
    }

    #[tokio::test]
    async fn record_payment_with_status_change() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;
        let details = PaymentDetails {
            payment_method_id: Some("pm_123".to_string()),
            transaction_id: Some("tx_456".to_string()),
            payment_status: Some("succeeded".to_string()),
        };

        let order = h
            .orders
            .record_payment(
                &RequestContext::background(),
                order_id,
                details.clone(),
                Some(OrderStatus::Paid),
                &UserId::new("payments"),
            )
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.version(), Version::new(2));

        let stored = h.order_store.get_by_id(order_id).await.unwrap();
        assert_eq!(stored.payment_details(), &details);
        assert_eq!(stored.status(), OrderStatus::Paid);
        assert_eq!(stored.version(), Version::new(2));
        assert_eq!(h.publisher.published_on(ORDER_STATUS_CHANGED_TOPIC).await.len(), 1);
    }

    #[tokio::test]
    async fn record_payment_without_status_change() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;
        let details = PaymentDetails {
            payment_status: Some("pending".to_string()),
            ..Default::default()
        };

        let order = h
            .orders
            .record_payment(
                &RequestContext::background(),
                order_id,
                details,
                None,
                &UserId::new("payments"),
            )
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::PendingPayment);
        assert_eq!(order.version(), Version::new(2));
        assert_eq!(h.order_store.get_by_id(order_id).await.unwrap().version(), Version::new(2));
        assert!(h.publisher.published_on(ORDER_STATUS_CHANGED_TOPIC).await.is_empty());
    }

    #[tokio::test]
    async fn record_payment_rejects_illegal_status() {
        let h = TestHarness::new().await;
        let order_id = h.place(&alice()).await;

        let result = h
            .orders
            .record_payment(
                &RequestContext::background(),
                order_id,
                PaymentDetails::default(),
                Some(OrderStatus::Delivered),
                &UserId::new("payments"),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidTransition { .. })));
        assert_eq!(h.order_store.get_by_id(order_id).await.unwrap().version(), Version::first());
    }
}
