//! Order orchestration.

use common::{OrderId, UserId, Version};
use domain::{Address, Order, OrderEvent, OrderItem, OrderStatus, PaymentDetails};
use store::{
    CartStore, CatalogLookup, EventPublisher, EventPublisherExt, OrderFilter, OrderPage,
    OrderStore, Pagination, ProductCache,
};

use crate::cart::CartService;
use crate::context::RequestContext;
use crate::error::{Result, ServiceError};

/// Places orders from carts and drives them through their lifecycle.
///
/// Every status write is conditional on the version read at the start of the
/// request. Conflicts are returned to the caller, never retried here. Cart
/// clearing and event publication after a committed write are best-effort.
pub struct OrderService<O, P, CS, PC, L>
where
    O: OrderStore,
    P: EventPublisher,
    CS: CartStore,
    PC: ProductCache,
    L: CatalogLookup,
{
    orders: O,
    publisher: P,
    carts: CartService<CS, PC, L>,
}

impl<O, P, CS, PC, L> OrderService<O, P, CS, PC, L>
where
    O: OrderStore,
    P: EventPublisher,
    CS: CartStore,
    PC: ProductCache,
    L: CatalogLookup,
{
    pub fn new(orders: O, publisher: P, carts: CartService<CS, PC, L>) -> Self {
        Self {
            orders,
            publisher,
            carts,
        }
    }

    /// Converts the user's priced cart into a new order awaiting payment.
    #[tracing::instrument(
        skip(self, ctx, shipping_address, billing_address),
        fields(user_id = %user_id)
    )]
    pub async fn place_order(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        shipping_address: Address,
        billing_address: Address,
    ) -> Result<Order> {
        let started = std::time::Instant::now();

        let cart = self.carts.get_cart(ctx, user_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let items = cart
            .items
            .iter()
            .map(|item| {
                OrderItem::new(
                    item.product_id.clone(),
                    item.product_name.clone(),
                    item.quantity,
                    item.unit_price,
                )
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let draft = Order::place(
            user_id.clone(),
            items,
            cart.total_amount,
            shipping_address,
            billing_address,
        )?;

        let order_id = ctx.run(self.orders.create(&draft)).await?;
        let order = draft.with_id(order_id);

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            %order_id,
            total = %order.total_amount(),
            items = order.item_count(),
            "order placed"
        );

        if let Err(e) = self.carts.clear_cart(ctx, user_id).await {
            Self::best_effort_failed("clear_cart", order_id, &e);
        }
        if let Some(event) = OrderEvent::order_created(&order) {
            self.publish(ctx, &event).await;
        }

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(order)
    }

    /// Loads an order visible to the requester.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_order_by_id(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        requester: &UserId,
        is_admin: bool,
    ) -> Result<Order> {
        let order = self.load(ctx, order_id).await?;
        if !is_admin && !order.is_owned_by(requester) {
            return Err(ServiceError::AccessDenied(format!(
                "order {order_id} does not belong to {requester}"
            )));
        }
        Ok(order)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_user_orders(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        pagination: Pagination,
    ) -> Result<OrderPage> {
        if user_id.is_blank() {
            return Err(ServiceError::InvalidInput("user ID is required".to_string()));
        }
        let filter = OrderFilter::for_user(user_id.clone()).pagination(pagination);
        ctx.run(self.orders.list(&filter)).await
    }

    /// Lists orders across all users. The caller has already checked that
    /// `admin_id` is an administrator.
    #[tracing::instrument(skip(self, ctx, filters))]
    pub async fn list_all_orders_admin(
        &self,
        ctx: &RequestContext,
        admin_id: &UserId,
        pagination: Pagination,
        filters: OrderFilter,
    ) -> Result<OrderPage> {
        let filter = filters.pagination(pagination);
        ctx.run(self.orders.list(&filter)).await
    }

    /// Cancels one of the user's own orders.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn cancel_user_order(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        user_id: &UserId,
    ) -> Result<Order> {
        let mut order = self.load(ctx, order_id).await?;
        if !order.is_owned_by(user_id) {
            return Err(ServiceError::AccessDenied(format!(
                "order {order_id} does not belong to {user_id}"
            )));
        }

        let expected_version = order.version();
        let old_status = order.status();
        order.cancel()?;

        self.write_status(ctx, &order, expected_version).await?;
        self.status_committed(ctx, &order, old_status, user_id).await;
        Ok(order)
    }

    /// Moves an order to any status the state machine allows. The caller has
    /// already checked that `admin_id` is an administrator.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_order_status_by_admin(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        new_status: OrderStatus,
        admin_id: &UserId,
    ) -> Result<Order> {
        let mut order = self.load(ctx, order_id).await?;

        let expected_version = order.version();
        let old_status = order.status();
        order.transition(new_status)?;
        if order.status() == old_status {
            return Ok(order);
        }

        self.write_status(ctx, &order, expected_version).await?;
        self.status_committed(ctx, &order, old_status, admin_id).await;
        Ok(order)
    }

    /// Records payment details and, optionally, a status change in one
    /// conditional write.
    #[tracing::instrument(skip(self, ctx, details))]
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        details: PaymentDetails,
        new_status: Option<OrderStatus>,
        admin_id: &UserId,
    ) -> Result<Order> {
        let mut order = self.load(ctx, order_id).await?;

        let expected_version = order.version();
        let old_status = order.status();
        order.attach_payment_details(details.clone());
        if let Some(status) = new_status {
            order.transition(status)?;
        }
        let changed_status = (order.status() != old_status).then_some(order.status());

        ctx.run(self.orders.update_payment_details(
            order_id,
            &details,
            changed_status,
            expected_version,
        ))
        .await
        .inspect_err(Self::note_conflict)?;
        order.mark_persisted(expected_version.next());
        tracing::info!(%order_id, version = %order.version(), "payment details recorded");

        if changed_status.is_some() {
            self.status_committed(ctx, &order, old_status, admin_id).await;
        }
        Ok(order)
    }

    async fn load(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order> {
        ctx.run(self.orders.get_by_id(order_id)).await
    }

    async fn write_status(
        &self,
        ctx: &RequestContext,
        order: &Order,
        expected_version: Version,
    ) -> Result<()> {
        let order_id = order
            .id()
            .ok_or_else(|| ServiceError::DataIntegrity("loaded order has no ID".to_string()))?;

        ctx.run(
            self.orders
                .update_status(order_id, order.status(), expected_version),
        )
        .await
        .inspect_err(Self::note_conflict)
    }

    async fn status_committed(
        &self,
        ctx: &RequestContext,
        order: &Order,
        old_status: OrderStatus,
        changed_by: &UserId,
    ) {
        metrics::counter!("order_status_changes_total", "to" => order.status().as_str())
            .increment(1);
        tracing::info!(
            order_id = ?order.id(),
            from = %old_status,
            to = %order.status(),
            version = %order.version(),
            "order status changed"
        );

        if let Some(event) = OrderEvent::status_changed(order, old_status, changed_by.as_str()) {
            self.publish(ctx, &event).await;
        }
    }

    async fn publish(&self, ctx: &RequestContext, event: &OrderEvent) {
        if let Err(e) = ctx.run(self.publisher.publish_event(event)).await {
            Self::best_effort_failed(event.topic(), event.order_id(), &e);
        }
    }

    fn note_conflict(err: &ServiceError) {
        if matches!(err, ServiceError::OptimisticLockConflict { .. }) {
            metrics::counter!("order_version_conflicts_total").increment(1);
        }
    }

    fn best_effort_failed(step: &'static str, order_id: OrderId, err: &ServiceError) {
        metrics::counter!("best_effort_failures_total", "step" => step).increment(1);
        tracing::warn!(%order_id, step, error = %err, "best-effort step failed");
    }
}
