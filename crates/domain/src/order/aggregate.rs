//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId, Version};
use serde::{Deserialize, Serialize};

use super::{Address, Money, OrderError, OrderItem, OrderStatus, PaymentDetails};

/// Order aggregate root.
///
/// Built once from a priced cart snapshot and afterwards only mutated through
/// status transitions and payment detail attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identifier, absent until persisted.
    id: Option<OrderId>,

    /// User who placed the order.
    user_id: UserId,

    /// Items in insertion order.
    items: Vec<OrderItem>,

    /// Total locked in at creation.
    total_amount: Money,

    status: OrderStatus,

    #[serde(default)]
    shipping_address: Address,

    #[serde(default)]
    billing_address: Address,

    #[serde(default)]
    payment_details: PaymentDetails,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    /// Current version for optimistic concurrency.
    version: Version,
}

/// Raw order fields, used by stores to rebuild a persisted order.
#[derive(Debug, Clone)]
pub struct OrderParts {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_details: PaymentDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl Order {
    /// Creates a new order awaiting payment.
    ///
    /// `total_amount` is the total of the priced cart the items were taken
    /// from and must equal the sum of the item totals.
    pub fn place(
        user_id: UserId,
        items: Vec<OrderItem>,
        total_amount: Money,
        shipping_address: Address,
        billing_address: Address,
    ) -> Result<Self, OrderError> {
        if user_id.is_blank() {
            return Err(OrderError::UserIdRequired);
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let calculated = Self::sum_items(&items).ok_or(OrderError::AmountOverflow)?;
        if calculated != total_amount {
            return Err(OrderError::TotalMismatch {
                expected: calculated,
                actual: total_amount,
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: None,
            user_id,
            items,
            total_amount,
            status: OrderStatus::PendingPayment,
            shipping_address,
            billing_address,
            payment_details: PaymentDetails::default(),
            created_at: now,
            updated_at: now,
            version: Version::first(),
        })
    }

    /// Rebuilds a persisted order without re-running creation checks.
    pub fn from_parts(parts: OrderParts) -> Self {
        Self {
            id: Some(parts.id),
            user_id: parts.user_id,
            items: parts.items,
            total_amount: parts.total_amount,
            status: parts.status,
            shipping_address: parts.shipping_address,
            billing_address: parts.billing_address,
            payment_details: parts.payment_details,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            version: parts.version,
        }
    }

    /// Returns the order with the store-assigned ID set.
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    fn sum_items(items: &[OrderItem]) -> Option<Money> {
        Money::checked_sum(items.iter().map(OrderItem::total_price))
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns true if `user_id` placed this order.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity()))
    }

    /// Returns the total amount locked in at creation.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Sums the item totals, or returns `None` on overflow. Does not touch
    /// the stored total.
    pub fn calculate_total(&self) -> Option<Money> {
        Self::sum_items(&self.items)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    pub fn payment_details(&self) -> &PaymentDetails {
        &self.payment_details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.status.can_be_cancelled()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Mutations
impl Order {
    /// Moves the order to `new_status`.
    ///
    /// Moving to the current status is a no-op. On a real change the updated
    /// timestamp is refreshed and the version incremented.
    pub fn transition(&mut self, new_status: OrderStatus) -> Result<(), OrderError> {
        if new_status == self.status {
            return Ok(());
        }

        if !self.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: new_status,
            });
        }

        self.status = new_status;
        self.updated_at = Utc::now();
        self.version = self.version.next();
        Ok(())
    }

    /// Moves the order to `Cancelled`, if its status still allows it.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.can_be_cancelled() {
            return Err(OrderError::CannotCancel {
                status: self.status,
            });
        }
        self.transition(OrderStatus::Cancelled)
    }

    /// Replaces the payment details. Status and version are left alone.
    pub fn attach_payment_details(&mut self, details: PaymentDetails) {
        self.payment_details = details;
        self.updated_at = Utc::now();
    }

    /// Aligns the version with the one the store assigned on its last write.
    pub fn mark_persisted(&mut self, version: Version) {
        self.version = version;
    }
}
