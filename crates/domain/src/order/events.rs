//! Integration events published after an order write commits.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId, Version};
use serde::{Deserialize, Serialize};

use super::{Money, Order, OrderStatus};

/// Topic for [`OrderEvent::OrderCreated`].
pub const ORDER_CREATED_TOPIC: &str = "order-created";

/// Topic for [`OrderEvent::OrderStatusChanged`].
pub const ORDER_STATUS_CHANGED_TOPIC: &str = "order-status-changed";

/// Events announced to other services about order changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// A new order was persisted.
    OrderCreated(OrderCreatedData),

    /// An order moved to a different status.
    OrderStatusChanged(OrderStatusChangedData),
}

impl OrderEvent {
    /// Returns the topic the event is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => ORDER_CREATED_TOPIC,
            OrderEvent::OrderStatusChanged(_) => ORDER_STATUS_CHANGED_TOPIC,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated(data) => data.order_id,
            OrderEvent::OrderStatusChanged(data) => data.order_id,
        }
    }

    /// Builds the creation event for a persisted order.
    ///
    /// Returns `None` if the order has not been assigned an ID yet.
    pub fn order_created(order: &Order) -> Option<Self> {
        Some(OrderEvent::OrderCreated(OrderCreatedData {
            order_id: order.id()?,
            user_id: order.user_id().clone(),
            total_amount: order.total_amount(),
            item_count: order.item_count(),
            status: order.status(),
            created_at: order.created_at(),
        }))
    }

    /// Builds the status change event for a persisted order.
    ///
    /// Returns `None` if the order has not been assigned an ID yet.
    pub fn status_changed(
        order: &Order,
        old_status: OrderStatus,
        changed_by: impl Into<String>,
    ) -> Option<Self> {
        Some(OrderEvent::OrderStatusChanged(OrderStatusChangedData {
            order_id: order.id()?,
            user_id: order.user_id().clone(),
            old_status,
            new_status: order.status(),
            version: order.version(),
            changed_by: changed_by.into(),
            changed_at: order.updated_at(),
        }))
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedData {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub item_count: usize,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Data for OrderStatusChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedData {
    pub order_id: OrderId,

    /// Owner of the order.
    pub user_id: UserId,

    pub old_status: OrderStatus,
    pub new_status: OrderStatus,

    /// Version of the order after the change.
    pub version: Version,

    /// The user or admin who requested the change.
    pub changed_by: String,

    pub changed_at: DateTime<Utc>,
}
