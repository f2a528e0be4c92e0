//! Cart store.
//!
//! The cart is an ordered list of line items persisted under
//! [`keys::CART`](crate::storage::keys::CART). [`CartStore`] is the only
//! writer of that key. Every mutation is a single read-modify-write followed
//! by one write of the whole cart, after which registered listeners are
//! called synchronously, in registration order, with the new snapshot.
//!
//! Invariants:
//! - at most one line per product id
//! - every stored line has `quantity >= 1`
//! - the total is derived on read, never stored

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use truffle_core::{Price, ProductId};

use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    /// Unit price captured when the product was first added.
    pub price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Snapshot of the cart contents, in order of first addition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Build a cart from stored lines, restoring the invariants.
    ///
    /// Zero-quantity lines are dropped and repeated ids are merged into the
    /// first occurrence. A line whose amount would overflow the cart total
    /// is dropped too.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::default();
        let mut total = Price::ZERO;
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            let Some(next_total) = line
                .price
                .checked_times(line.quantity)
                .and_then(|amount| total.checked_add(amount))
            else {
                warn!(product_id = %line.id, "Dropping cart line with overflowing amount");
                continue;
            };
            total = next_total;
            match cart.lines.iter_mut().find(|l| l.id == line.id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// The line items.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |sum, l| sum.saturating_add(l.quantity))
    }

    /// Sum of `price × quantity` across all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn add(&mut self, id: ProductId, name: &str, price: Price) {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                id,
                name: name.to_string(),
                price,
                quantity: 1,
            }),
        }
    }

    /// Returns whether the cart changed.
    fn set_quantity(&mut self, id: ProductId, quantity: i64) -> bool {
        let Some(pos) = self.lines.iter().position(|l| l.id == id) else {
            return false;
        };
        match u32::try_from(quantity) {
            Ok(q) if q > 0 => {
                if let Some(line) = self.lines.get_mut(pos) {
                    line.quantity = q;
                }
            }
            // Out-of-range positive values saturate; zero and below remove.
            Err(_) if quantity > 0 => {
                if let Some(line) = self.lines.get_mut(pos) {
                    line.quantity = u32::MAX;
                }
            }
            _ => {
                self.lines.remove(pos);
            }
        }
        true
    }

    /// Returns whether a line was removed.
    fn remove(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }
}

/// Callback invoked after every successful cart write.
pub type CartListener = Arc<dyn Fn(&Cart) + Send + Sync>;

/// Handle to the persisted cart.
///
/// Cheap to clone; clones share storage, listeners and the mutation lock.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn KeyValueStore>,
    listeners: Mutex<Vec<CartListener>>,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl CartStore {
    /// Create a cart store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                listeners: Mutex::new(Vec::new()),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Current cart. Missing or corrupt state reads as an empty cart.
    #[must_use]
    pub fn get(&self) -> Cart {
        read_json::<Vec<CartLine>>(self.inner.storage.as_ref(), keys::CART)
            .map(Cart::from_lines)
            .unwrap_or_default()
    }

    /// Current total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.get().total()
    }

    /// Current item count.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.get().item_count()
    }

    /// Add one unit of a product, appending a new line if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self, name), fields(product_id = %id))]
    pub fn add(&self, id: ProductId, name: &str, price: Price) -> Result<Cart, StorageError> {
        self.mutate(|cart| {
            cart.add(id, name, price);
            true
        })
    }

    /// Set a line's quantity; `quantity <= 0` removes the line.
    ///
    /// Does nothing (and notifies nobody) if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn set_quantity(&self, id: ProductId, quantity: i64) -> Result<Cart, StorageError> {
        self.mutate(|cart| cart.set_quantity(id, quantity))
    }

    /// Remove a product's line if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove(&self, id: ProductId) -> Result<Cart, StorageError> {
        self.mutate(|cart| cart.remove(id))
    }

    /// Empty the cart.
    ///
    /// Always writes and notifies, even if the cart was already empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<Cart, StorageError> {
        self.mutate(|cart| {
            *cart = Cart::default();
            true
        })
    }

    /// Register a listener called after every successful write.
    pub fn subscribe(&self, listener: CartListener) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    fn mutate(&self, apply: impl FnOnce(&mut Cart) -> bool) -> Result<Cart, StorageError> {
        let cart = {
            let _guard = self
                .inner
                .write_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let mut cart = self.get();
            if !apply(&mut cart) {
                debug!("Cart unchanged, skipping write");
                return Ok(cart);
            }

            write_json(self.inner.storage.as_ref(), keys::CART, &cart)?;
            debug!(
                lines = cart.len(),
                items = cart.item_count(),
                "Cart persisted"
            );
            cart
        };

        // Neither lock is held while listeners run, so they may subscribe or mutate.
        let listeners: Vec<CartListener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(&cart);
        }

        Ok(cart)
    }
}
