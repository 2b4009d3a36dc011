use async_trait::async_trait;
use common::{OrderId, UserId, Version};
use domain::{Order, OrderParts, OrderStatus, PaymentDetails};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Persistence port for orders.
///
/// Every mutating call takes the version the caller read. Implementations
/// must match on `(id, version)` atomically, bump the version on success and
/// report `NotFound` or `VersionConflict` when nothing matched.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order and returns its assigned ID. The stored order
    /// starts at version 1.
    async fn create(&self, draft: &Order) -> Result<OrderId>;

    /// Loads an order, failing with `NotFound` if it does not exist.
    async fn get_by_id(&self, id: OrderId) -> Result<Order>;

    /// Sets the status if the stored version equals `expected_version`.
    async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
        expected_version: Version,
    ) -> Result<()>;

    /// Replaces the payment details, optionally changing the status in the
    /// same write, if the stored version equals `expected_version`.
    async fn update_payment_details(
        &self,
        id: OrderId,
        details: &PaymentDetails,
        new_status: Option<OrderStatus>,
        expected_version: Version,
    ) -> Result<()>;

    /// Returns one page of orders matching the filter and the total number
    /// of matches.
    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage>;
}

/// Column an order listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    Status,
}

impl SortField {
    /// Returns the database column backing this field.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::TotalAmount => "total_amount_cents",
            SortField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Page selection for order listings. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Creates a pagination, normalizing a zero page to the first page and
    /// clamping the page size to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Self {
        let page_size = match page_size {
            0 => Self::DEFAULT_PAGE_SIZE,
            size => size.min(Self::MAX_PAGE_SIZE),
        };
        Self {
            page: page.max(1),
            page_size,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }

    pub fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.sort_order = order;
        self
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// Builder for order listing queries.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only orders placed by this user.
    pub user_id: Option<UserId>,

    /// Only orders in this status.
    pub status: Option<OrderStatus>,

    pub pagination: Pagination,
}

impl OrderFilter {
    /// Creates a filter matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter for the orders of one user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Returns true if the order passes the user and status filters.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(ref user_id) = self.user_id
            && order.user_id() != user_id
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status() != status
        {
            return false;
        }
        true
    }
}

/// One page of an order listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,

    /// Number of orders matching the filter across all pages.
    pub total_count: u64,

    pub page: u32,
    pub page_size: u32,
}

impl OrderPage {
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_size.max(1)))
    }
}

/// Splits a draft into stored fields under the given ID, starting at version 1.
pub(crate) fn draft_parts(id: OrderId, draft: &Order) -> OrderParts {
    OrderParts {
        id,
        user_id: draft.user_id().clone(),
        items: draft.items().to_vec(),
        total_amount: draft.total_amount(),
        status: draft.status(),
        shipping_address: draft.shipping_address().clone(),
        billing_address: draft.billing_address().clone(),
        payment_details: draft.payment_details().clone(),
        created_at: draft.created_at(),
        updated_at: draft.updated_at(),
        version: Version::first(),
    }
}
