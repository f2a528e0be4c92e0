//! Catalog page: product grid and add-to-cart.

use std::sync::Arc;

use askama::Template;
use tracing::{info, instrument, warn};

use crate::api::{Product, TruffleApi};
use crate::cart::{Cart, CartStore};
use crate::error::{AppError, add_breadcrumb};
use crate::page::{Navigation, Page};
use crate::session::IdentityCache;
use crate::views::{ProductGridTemplate, Region, Surface, Tone};

/// Drives the catalog page.
#[derive(Clone)]
pub struct CatalogController<A> {
    api: A,
    cart: CartStore,
    identity: IdentityCache,
    surface: Arc<dyn Surface>,
}

impl<A: TruffleApi> CatalogController<A> {
    #[must_use]
    pub fn new(api: A, cart: CartStore, identity: IdentityCache, surface: Arc<dyn Surface>) -> Self {
        Self {
            api,
            cart,
            identity,
            surface,
        }
    }

    /// Fetch the products and render the grid.
    ///
    /// A failed fetch renders a message and returns no products.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid template fails to render.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Product>, AppError> {
        match self.api.products().await {
            Ok(products) => {
                let html = ProductGridTemplate::new(&products).render()?;
                self.surface.replace(Region::ProductGrid, html);
                info!(count = products.len(), "Catalog loaded");
                Ok(products)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                self.surface
                    .message(Region::ProductGrid, Tone::Error, "Could not load products.");
                Ok(Vec::new())
            }
        }
    }

    /// Add one unit of `product` to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add_to_cart(&self, product: &Product) -> Result<Cart, AppError> {
        let cart = self.cart.add(product.id, &product.name, product.price)?;
        add_breadcrumb(
            "cart",
            "Added to cart",
            &[("product_id", &product.id.to_string())],
        );
        self.surface
            .alert(&format!("{} added to cart!", product.name));
        Ok(cart)
    }

    /// Leave for checkout, or for login if nobody is logged in.
    pub fn proceed_to_checkout(&self) -> Navigation {
        if self.identity.get().is_some() {
            Navigation::Redirect(Page::Checkout)
        } else {
            self.surface.alert("Please login to proceed to checkout.");
            Navigation::Redirect(Page::Login)
        }
    }
}
