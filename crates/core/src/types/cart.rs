//! Shopping cart reducer.
//!
//! The cart is a list of lines keyed by product ID. Adding a product that is
//! already present bumps its quantity instead of adding a second line. The
//! serialized form is the array the clients persist locally:
//!
//! ```json
//! [{"id": "...", "name": "Paracetamol 500mg", "price": 2990, "quantity": 2,
//!   "imageUrl": null, "isControlled": false}]
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
    pub is_controlled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription_uploaded: Option<bool>,
}

impl CartItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Product data needed to add a line; the cart owns the quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_controlled: bool,
    pub prescription_uploaded: Option<bool>,
}

impl NewCartItem {
    /// A non-controlled product with no image.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image_url: None,
            is_controlled: false,
            prescription_uploaded: None,
        }
    }

    /// Mark the product as a controlled drug.
    #[must_use]
    pub const fn controlled(mut self, is_controlled: bool) -> Self {
        self.is_controlled = is_controlled;
        self
    }

    /// Attach a product image URL.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Record whether a prescription was attached when adding.
    #[must_use]
    pub const fn with_prescription(mut self, uploaded: bool) -> Self {
        self.prescription_uploaded = Some(uploaded);
        self
    }
}

/// Ordered collection of cart lines, unique by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a cart from persisted lines.
    ///
    /// Duplicate IDs are merged and zero-quantity lines dropped, so a
    /// hand-edited or stale file cannot break the uniqueness invariant.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            if let Some(existing) = cart.items.iter_mut().find(|i| i.id == item.id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                cart.items.push(item);
            }
        }
        cart
    }

    /// Add one unit of a product.
    pub fn add_item(&mut self, item: NewCartItem) {
        self.add_units(item, 1);
    }

    /// Add `quantity` units of a product in one step. Zero is a no-op.
    pub fn add_units(&mut self, item: NewCartItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return;
        }
        self.items.push(CartItem {
            id: item.id,
            name: item.name,
            price: item.price,
            quantity,
            image_url: item.image_url,
            is_controlled: item.is_controlled,
            prescription_uploaded: item.prescription_uploaded,
        });
    }

    /// Remove a product's line entirely.
    pub fn remove_item(&mut self, id: ProductId) {
        self.items.retain(|i| i.id != id);
    }

    /// Set a line's quantity; zero or below removes the line.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Flag that a prescription has been uploaded for a controlled line.
    pub fn mark_prescription_uploaded(&mut self, id: ProductId) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.prescription_uploaded = Some(true);
        }
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Cart total as a CLP price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::clp(self.total())
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by product ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Controlled lines that still have no prescription attached.
    pub fn missing_prescriptions(&self) -> impl Iterator<Item = &CartItem> {
        self.items
            .iter()
            .filter(|i| i.is_controlled && i.prescription_uploaded != Some(true))
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}
