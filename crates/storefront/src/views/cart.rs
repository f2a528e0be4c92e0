//! Cart views: header badge, cart table and totals.
//!
//! The renderer is a pure projection of a [`Cart`] snapshot. It re-renders
//! everything on each change notification; there is no diffing.

use std::sync::{Arc, Mutex, PoisonError};

use askama::Template;

use truffle_core::ProductId;

use crate::cart::{Cart, CartLine, CartStore};
use crate::page::Page;
use crate::storage::StorageError;

use super::{Region, Surface};

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub total: String,
    pub item_count: u32,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id,
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price.display(),
            line_price: line.line_total().display(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total = cart.total().display();
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            // Delivery is free, so subtotal and total coincide.
            subtotal: total.clone(),
            total,
            item_count: cart.item_count(),
        }
    }
}

/// Cart count badge fragment.
#[derive(Template)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Cart table rows fragment.
#[derive(Template)]
#[template(path = "cart/items.html")]
pub struct CartItemsTemplate<'a> {
    pub cart: &'a CartView,
}

/// Projects cart snapshots onto a surface.
#[derive(Clone)]
pub struct CartRenderer {
    surface: Arc<dyn Surface>,
    with_table: bool,
}

impl CartRenderer {
    /// Renderer for the header badge only (every page).
    #[must_use]
    pub fn badge(surface: Arc<dyn Surface>) -> Self {
        Self {
            surface,
            with_table: false,
        }
    }

    /// Renderer for the badge plus the cart table and totals (cart page).
    #[must_use]
    pub fn full(surface: Arc<dyn Surface>) -> Self {
        Self {
            surface,
            with_table: true,
        }
    }

    /// Renderer for `page`: the full cart view on the cart page, the badge
    /// elsewhere.
    #[must_use]
    pub fn for_page(page: Page, surface: Arc<dyn Surface>) -> Self {
        if page == Page::Cart {
            Self::full(surface)
        } else {
            Self::badge(surface)
        }
    }

    /// Render `cart` in full.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to render.
    pub fn render(&self, cart: &Cart) -> askama::Result<()> {
        let view = CartView::from(cart);

        let badge = CartCountTemplate {
            count: view.item_count,
        }
        .render()?;
        self.surface.replace(Region::CartBadge, badge);

        if self.with_table {
            let rows = CartItemsTemplate { cart: &view }.render()?;
            self.surface.replace(Region::CartItems, rows);
            self.surface
                .replace(Region::CartSubtotal, view.subtotal.clone());
            self.surface.replace(Region::CartTotal, view.total.clone());
        }
        Ok(())
    }

    /// Re-render on every change to `store`, picking the renderer for the
    /// page current at notification time.
    pub fn follow(store: &CartStore, surface: Arc<dyn Surface>, page: Arc<Mutex<Page>>) {
        store.subscribe(Arc::new(move |cart: &Cart| {
            let page = *page.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = Self::for_page(page, Arc::clone(&surface)).render(cart) {
                tracing::error!(error = %e, "Failed to re-render cart");
            }
        }));
    }

    /// Handle a committed edit of a quantity input.
    ///
    /// The raw input is parsed as an integer; anything unparsable counts as
    /// zero and removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn on_quantity_change(
        store: &CartStore,
        id: ProductId,
        raw: &str,
    ) -> Result<Cart, StorageError> {
        let quantity = raw.trim().parse::<i64>().unwrap_or_else(|_| {
            tracing::debug!(input = raw, "Unparsable quantity treated as zero");
            0
        });
        store.set_quantity(id, quantity)
    }

    /// Handle a click on a line's remove control.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn on_remove(store: &CartStore, id: ProductId) -> Result<Cart, StorageError> {
        store.remove(id)
    }
}
