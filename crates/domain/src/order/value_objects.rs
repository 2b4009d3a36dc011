//! Value objects for the order domain.

use common::ProductId;
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        (self.cents % 100).abs()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, or returns `None` if the result does not
    /// fit in cents.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Sums amounts, or returns `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().unsigned_abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// A priced line of an order.
///
/// Immutable once built: the unit price is locked in at order creation even
/// if the catalog price changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    unit_price: Money,
    total_price: Money,
}

impl OrderItem {
    /// Creates a validated order item.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        let product_id = product_id.into();
        let product_name = product_name.into();

        if product_id.is_blank() {
            return Err(OrderError::EmptyProductId);
        }
        if product_name.trim().is_empty() {
            return Err(OrderError::EmptyProductName { product_id });
        }
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if unit_price.is_negative() {
            return Err(OrderError::InvalidPrice {
                price: unit_price.cents(),
            });
        }

        let total_price = unit_price
            .checked_multiply(quantity)
            .ok_or(OrderError::AmountOverflow)?;

        Ok(Self {
            total_price,
            product_id,
            product_name,
            quantity,
            unit_price,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns quantity * unit_price, computed at construction.
    pub fn total_price(&self) -> Money {
        self.total_price
    }
}

/// Postal address attached to an order. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Payment metadata reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_sum() {
        let total = Money::checked_sum([Money::from_cents(1000), Money::from_cents(250)]);
        assert_eq!(total, Some(Money::from_cents(1250)));
        assert_eq!(Money::checked_sum([]), Some(Money::zero()));
    }

    #[test]
    fn test_money_arithmetic_overflow_is_none() {
        let big = Money::from_cents(5_000_000_000);
        assert_eq!(big.checked_multiply(4_000_000_000), None);
        assert_eq!(big.checked_multiply(3), Some(Money::from_cents(15_000_000_000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]),
            None
        );
    }

    #[test]
    fn test_order_item_total_price() {
        let item = OrderItem::new("SKU-001", "Widget", 3, Money::from_cents(1000)).unwrap();
        assert_eq!(item.total_price().cents(), 3000);
    }

    #[test]
    fn test_order_item_allows_free_items() {
        let item = OrderItem::new("SKU-FREE", "Sticker", 1, Money::zero()).unwrap();
        assert!(item.total_price().is_zero());
    }

    #[test]
    fn test_order_item_validation() {
        assert!(matches!(
            OrderItem::new("", "Widget", 1, Money::from_cents(100)),
            Err(OrderError::EmptyProductId)
        ));
        assert!(matches!(
            OrderItem::new("SKU-001", " ", 1, Money::from_cents(100)),
            Err(OrderError::EmptyProductName { .. })
        ));
        assert!(matches!(
            OrderItem::new("SKU-001", "Widget", 0, Money::from_cents(100)),
            Err(OrderError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            OrderItem::new("SKU-001", "Widget", 1, Money::from_cents(-1)),
            Err(OrderError::InvalidPrice { price: -1 })
        ));
        assert!(matches!(
            OrderItem::new("SKU-001", "Widget", u32::MAX, Money::from_cents(i64::MAX / 2)),
            Err(OrderError::AmountOverflow)
        ));
    }

    #[test]
    fn test_address_deserializes_partial_json() {
        let address: Address = serde_json::from_str(r#"{"city": "Lisbon"}"#).unwrap();
        assert_eq!(address.city.as_deref(), Some("Lisbon"));
        assert!(address.street.is_none());
    }
}
