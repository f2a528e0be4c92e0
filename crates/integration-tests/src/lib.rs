//! End-to-end tests for the Truffle storefront.
//!
//! The storefront is wired exactly as in production (`HttpApiClient` over a
//! cookie-carrying `reqwest` client) but pointed at a [`FakeBackend`] that
//! runs in-process on a loopback port. Persisted state and rendering use the
//! in-memory store and surface, so tests can inspect both.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p truffle-integration-tests
//! ```
//!
//! No external services are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod backend;

pub use backend::{FakeBackend, FakeBackendBuilder};

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};
use secrecy::SecretString;

use truffle_core::{DeliveryDays, ProductId};
use truffle_storefront::api::HttpApiClient;
use truffle_storefront::cart::Cart;
use truffle_storefront::config::ApiConfig;
use truffle_storefront::page::{Navigation, Page};
use truffle_storefront::state::Storefront;
use truffle_storefront::storage::MemoryStore;
use truffle_storefront::views::MemorySurface;

/// Seeded shopper used across tests.
pub const ADA_NAME: &str = "Ada";
pub const ADA_EMAIL: &str = "ada@truffle.shop";
pub const ADA_PASSWORD: &str = "tartufo-nero";
pub const ADA_ADDRESS: &str = "Via Roma 1, Alba";

/// A storefront talking to a fake backend.
pub struct TestShop {
    pub backend: FakeBackend,
    pub storefront: Storefront<HttpApiClient>,
    pub surface: Arc<MemorySurface>,
    pub storage: Arc<MemoryStore>,
}

impl TestShop {
    /// Wire a storefront to `backend` with a generous request timeout.
    #[must_use]
    pub fn new(backend: FakeBackend) -> Self {
        Self::with_timeout(backend, Duration::from_secs(5))
    }

    /// Wire a storefront to `backend` with the given request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn with_timeout(backend: FakeBackend, timeout: Duration) -> Self {
        let mut config = ApiConfig::new(backend.base_url().clone());
        config.timeout = timeout;
        config.catalog_cache_ttl = Duration::ZERO;

        let api = HttpApiClient::new(&config).expect("Failed to create API client");
        let surface = Arc::new(MemorySurface::new());
        let storage = Arc::new(MemoryStore::new());
        let storefront = Storefront::new(
            api,
            storage.clone(),
            surface.clone(),
            DeliveryDays::default(),
        );

        Self {
            backend,
            storefront,
            surface,
            storage,
        }
    }

    /// A backend with Ada registered, and a storefront for it.
    pub async fn with_ada() -> Self {
        Self::new(seeded().start().await)
    }

    /// Log in from the login page.
    ///
    /// # Panics
    ///
    /// Panics if local state cannot be updated.
    pub async fn login(&self, email: &str, password: &str) -> Navigation {
        self.storefront
            .load(Page::Login)
            .await
            .expect("Failed to load login page");
        self.storefront
            .session_gate()
            .login(email, &SecretString::from(password))
            .await
            .expect("Failed to cache identity")
    }

    /// Add `quantity` units of each product from the catalog page.
    ///
    /// # Panics
    ///
    /// Panics if a product is not in the catalog or the cart cannot be saved.
    pub async fn fill_cart(&self, lines: &[(i64, u32)]) -> Cart {
        self.storefront
            .load(Page::Catalog)
            .await
            .expect("Failed to load catalog page");
        let catalog = self.storefront.catalog();
        let products = catalog.load().await.expect("Failed to render catalog");

        for &(id, quantity) in lines {
            let product = products
                .iter()
                .find(|p| p.id == ProductId::new(id))
                .expect("Product not in catalog");
            for _ in 0..quantity {
                catalog.add_to_cart(product).expect("Failed to add to cart");
            }
        }
        self.storefront.cart().get()
    }
}

/// A backend builder with Ada registered.
#[must_use]
pub fn seeded() -> FakeBackendBuilder {
    FakeBackend::builder().user(ADA_NAME, ADA_EMAIL, ADA_PASSWORD, Some(ADA_ADDRESS))
}

/// The first `weekday` strictly after `from`.
#[must_use]
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + chrono::Days::new(if ahead == 0 { 7 } else { u64::from(ahead) })
}
