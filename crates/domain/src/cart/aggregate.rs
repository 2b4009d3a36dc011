//! Cart aggregate implementation.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::CartError;

/// A product and quantity staged in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user's staging area for items not yet ordered.
///
/// There is at most one cart per user; a missing cart behaves as an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    user_id: UserId,

    /// Items keyed by product ID, in the order they were first added.
    items: Vec<CartItem>,

    updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get_item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.get_item(product_id).is_some()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Adds `quantity` of a product.
    ///
    /// If the product is already in the cart, its quantity is increased
    /// instead of adding a second line.
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if product_id.is_blank() {
            return Err(CartError::EmptyProductId);
        }
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }

        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id,
                quantity,
            }),
        }
        self.touch();
        Ok(())
    }

    /// Sets the quantity of an existing item. A quantity of zero or less
    /// removes the item.
    pub fn update_item_quantity(
        &mut self,
        product_id: &ProductId,
        new_quantity: i64,
    ) -> Result<(), CartError> {
        let position = self.position(product_id)?;

        if new_quantity <= 0 {
            self.items.remove(position);
        } else {
            let quantity = u32::try_from(new_quantity).map_err(|_| CartError::InvalidQuantity {
                quantity: new_quantity,
            })?;
            self.items[position].quantity = quantity;
        }
        self.touch();
        Ok(())
    }

    /// Removes an item from the cart.
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        let position = self.position(product_id)?;
        self.items.remove(position);
        self.touch();
        Ok(())
    }

    /// Empties the item list.
    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn position(&self, product_id: &ProductId) -> Result<usize, CartError> {
        self.items
            .iter()
            .position(|item| &item.product_id == product_id)
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.clone(),
            })
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
