//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// PENDING_PAYMENT ──► PAID ──► PROCESSING ──► SHIPPED ──► DELIVERED
///    │    ▲             │           │            │
///    │    └── FAILED    └───────────┴────────────┴──► CANCELLED
///    └──────────────────────────────────────────────► CANCELLED
/// ```
/// Any status may additionally move to `FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order was placed and awaits payment.
    #[default]
    PendingPayment,

    /// Payment was confirmed.
    Paid,

    /// Order is being prepared for shipment.
    Processing,

    /// Order left the warehouse.
    Shipped,

    /// Order reached the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,

    /// Payment or processing failed; may be retried.
    Failed,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];

    /// Returns the statuses reachable from this one through the regular
    /// lifecycle. The unconditional move to `Failed` is not listed here.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::PendingPayment => &[
                OrderStatus::Paid,
                OrderStatus::Cancelled,
                OrderStatus::Failed,
            ],
            OrderStatus::Paid => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
            OrderStatus::Failed => &[OrderStatus::PendingPayment],
        }
    }

    /// Returns true if an order in this status may move to `next`.
    ///
    /// Staying in the same status and moving to `Failed` are always allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next || next == OrderStatus::Failed || self.allowed_transitions().contains(&next)
    }

    /// Returns true if the order can be cancelled by its owner in this status.
    pub fn can_be_cancelled(&self) -> bool {
        matches!(
            self,
            OrderStatus::PendingPayment | OrderStatus::Paid | OrderStatus::Processing
        )
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored and published.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Parses a stored status name. Unrecognized values are an error rather
    /// than a fallback status.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}
