//! Persisted shopping cart.
//!
//! [`CartStore`] wraps the [`Cart`] reducer and writes the line list to the
//! key-value store after every mutation, so the cart survives reloads. The
//! stored value is the plain JSON array of lines under [`CART_STORAGE_KEY`].

use std::sync::{Arc, PoisonError, RwLock};

use farmacia_client::storage::save_json;
use farmacia_client::{KeyValueStore, StorageError};
use farmacia_core::{Cart, CartItem, NewCartItem, Price, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Storage key of the persisted cart.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Button text while a controlled product still needs its prescription.
pub const PRESCRIPTION_REQUIRED_MESSAGE: &str = "Sube la receta primero";

#[derive(Debug, Error)]
pub enum CartError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Controlled product added before its prescription was uploaded.
    #[error("{}", PRESCRIPTION_REQUIRED_MESSAGE)]
    PrescriptionRequired(ProductId),

    /// The backend sent the product without a price.
    #[error("Producto sin precio")]
    MissingPrice(ProductId),
}

/// Process-wide cart, shared through `Arc`.
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    cart: RwLock<Cart>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the saved cart, empty when nothing is stored.
    ///
    /// A stored value that is not a valid cart is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the store cannot be read.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, CartError> {
        let cart = match store.get(CART_STORAGE_KEY)? {
            None => Cart::new(),
            Some(raw) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => Cart::from_items(items),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable stored cart");
                    Cart::new()
                }
            },
        };
        debug!(lines = cart.items().len(), "Cart restored");
        Ok(Self {
            store,
            cart: RwLock::new(cart),
        })
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.read().clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.read().items().to_vec()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<CartItem> {
        self.read().get(id).cloned()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.read().total()
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        self.read().total_price()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.read().item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Controlled lines still waiting for a prescription.
    #[must_use]
    pub fn missing_prescriptions(&self) -> Vec<CartItem> {
        self.read().missing_prescriptions().cloned().collect()
    }

    /// Add one unit.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved; the cart is
    /// left as it was.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub fn add_item(&self, item: NewCartItem) -> Result<(), CartError> {
        self.mutate(|cart| cart.add_item(item))
    }

    /// Add `quantity` units with a single write.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub fn add_units(&self, item: NewCartItem, quantity: u32) -> Result<(), CartError> {
        self.mutate(|cart| cart.add_units(item, quantity))
    }

    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self))]
    pub fn remove_item(&self, id: ProductId) -> Result<(), CartError> {
        self.mutate(|cart| cart.remove_item(id))
    }

    /// Set a line's quantity; zero or below removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, id: ProductId, quantity: i64) -> Result<(), CartError> {
        self.mutate(|cart| cart.update_quantity(id, quantity))
    }

    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self))]
    pub fn mark_prescription_uploaded(&self, id: ProductId) -> Result<(), CartError> {
        self.mutate(|cart| cart.mark_prescription_uploaded(id))
    }

    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), CartError> {
        self.mutate(Cart::clear)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Cart> {
        self.cart.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(&self, apply: impl FnOnce(&mut Cart)) -> Result<(), CartError> {
        let mut cart = self.cart.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = cart.clone();
        apply(&mut next);
        save_json(self.store.as_ref(), CART_STORAGE_KEY, &next)?;
        debug!(items = next.item_count(), "Cart saved");
        *cart = next;
        Ok(())
    }
}
