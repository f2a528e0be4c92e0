//! Storefront state shared across pages.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::instrument;

use truffle_core::DeliveryDays;

use crate::api::{HttpApiClient, OrderRecord, TruffleApi};
use crate::cart::CartStore;
use crate::catalog::CatalogController;
use crate::checkout::CheckoutController;
use crate::config::StorefrontConfig;
use crate::confirmation::show_confirmation;
use crate::error::AppError;
use crate::page::{Navigation, Page, PageEntry};
use crate::profile::ProfileController;
use crate::session::{IdentityCache, SessionGate};
use crate::storage::{FileStore, KeyValueStore};
use crate::views::{CartRenderer, Surface};

/// Everything the pages share: the API client, persisted state and the
/// surface they render onto.
///
/// This struct is cheaply cloneable via `Arc`. The cart view follows the
/// current page: every cart change re-renders the badge, and on the cart
/// page the table and totals as well.
pub struct Storefront<A> {
    inner: Arc<StorefrontInner<A>>,
}

impl<A> Clone for Storefront<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StorefrontInner<A> {
    api: A,
    storage: Arc<dyn KeyValueStore>,
    cart: CartStore,
    identity: IdentityCache,
    surface: Arc<dyn Surface>,
    delivery_days: DeliveryDays,
    page: Arc<Mutex<Page>>,
}

impl<A: TruffleApi> Storefront<A> {
    /// Create the shared state and hook the cart view to the cart store.
    #[must_use]
    pub fn new(
        api: A,
        storage: Arc<dyn KeyValueStore>,
        surface: Arc<dyn Surface>,
        delivery_days: DeliveryDays,
    ) -> Self {
        let cart = CartStore::new(Arc::clone(&storage));
        let identity = IdentityCache::new(Arc::clone(&storage));
        let page = Arc::new(Mutex::new(Page::Home));

        CartRenderer::follow(&cart, Arc::clone(&surface), Arc::clone(&page));

        Self {
            inner: Arc::new(StorefrontInner {
                api,
                storage,
                cart,
                identity,
                surface,
                delivery_days,
                page,
            }),
        }
    }

    /// Get a reference to the shop API client.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Get a reference to the persisted key-value store.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.storage
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityCache {
        &self.inner.identity
    }

    #[must_use]
    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.inner.surface
    }

    #[must_use]
    pub fn delivery_days(&self) -> &DeliveryDays {
        &self.inner.delivery_days
    }

    /// The page currently loaded.
    #[must_use]
    pub fn page(&self) -> Page {
        *self.inner.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn session_gate(&self) -> SessionGate<A> {
        SessionGate::new(
            self.inner.api.clone(),
            self.inner.identity.clone(),
            Arc::clone(&self.inner.surface),
        )
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogController<A> {
        CatalogController::new(
            self.inner.api.clone(),
            self.inner.cart.clone(),
            self.inner.identity.clone(),
            Arc::clone(&self.inner.surface),
        )
    }

    /// Cart renderer for the current page.
    #[must_use]
    pub fn cart_renderer(&self) -> CartRenderer {
        CartRenderer::for_page(self.page(), Arc::clone(&self.inner.surface))
    }

    /// Load `page`: render the cart view, then run the session gate.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or local state cannot be updated.
    #[instrument(skip(self), fields(page = %page))]
    pub async fn load(&self, page: Page) -> Result<Navigation, AppError> {
        *self.inner.page.lock().unwrap_or_else(PoisonError::into_inner) = page;
        self.cart_renderer().render(&self.inner.cart.get())?;
        let (_, navigation) = self.session_gate().refresh(page).await?;
        Ok(navigation)
    }

    /// Load the checkout page for a delivery no earlier than `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or local state cannot be updated.
    pub async fn open_checkout(
        &self,
        today: NaiveDate,
    ) -> Result<PageEntry<CheckoutController<A>>, AppError> {
        let user = match self.enter_gated(Page::Checkout).await? {
            PageEntry::Ready(user) => user,
            PageEntry::Redirected(page) => return Ok(PageEntry::Redirected(page)),
        };
        Ok(PageEntry::Ready(CheckoutController::open(self, user, today)?))
    }

    /// Load the profile page and its order history.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or local state cannot be updated.
    pub async fn open_profile(&self) -> Result<PageEntry<ProfileController<A>>, AppError> {
        let user = match self.enter_gated(Page::Profile).await? {
            PageEntry::Ready(user) => user,
            PageEntry::Redirected(page) => return Ok(PageEntry::Redirected(page)),
        };
        let mut profile = ProfileController::open(
            self.inner.api.clone(),
            self.inner.identity.clone(),
            Arc::clone(&self.inner.surface),
            user,
        )?;
        profile.load_order_history().await?;
        Ok(PageEntry::Ready(profile))
    }

    /// Load the order confirmation page and show the last placed order.
    ///
    /// The snapshot is only consumed if the page is not redirected away.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or local state cannot be updated.
    pub async fn open_confirmation(&self) -> Result<PageEntry<Option<OrderRecord>>, AppError> {
        if let Navigation::Redirect(target) = self.load(Page::OrderConfirmation).await? {
            return Ok(PageEntry::Redirected(target));
        }
        let order = show_confirmation(self.inner.storage.as_ref(), self.inner.surface.as_ref())?;
        Ok(PageEntry::Ready(order))
    }

    /// Run the session gate, then require a cached identity.
    ///
    /// The gate settles first, so a logged-out check has already purged the
    /// cache and the page redirects without doing any work.
    async fn enter_gated(
        &self,
        page: Page,
    ) -> Result<PageEntry<crate::api::SessionIdentity>, AppError> {
        if let Navigation::Redirect(target) = self.load(page).await? {
            return Ok(PageEntry::Redirected(target));
        }
        Ok(self
            .inner
            .identity
            .require_session(page, self.inner.surface.as_ref()))
    }
}

impl Storefront<HttpApiClient> {
    /// Production wiring: HTTP client and file-backed state from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn from_config(
        config: &StorefrontConfig,
        surface: Arc<dyn Surface>,
    ) -> Result<Self, AppError> {
        let storage = FileStore::open(&config.state_dir)?;
        let api = HttpApiClient::new(&config.api)?;
        Ok(Self::new(
            api,
            Arc::new(storage),
            surface,
            config.delivery_days.clone(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use truffle_core::{Price, ProductId};

    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_support::{MockApi, identity, logged_in, logged_out, order_record};
    use crate::views::{MemorySurface, Region};

    fn storefront(api: &MockApi) -> (Storefront<MockApi>, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        let storefront = Storefront::new(
            api.clone(),
            Arc::new(MemoryStore::new()),
            surface.clone(),
            DeliveryDays::default(),
        );
        (storefront, surface)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_cart_view_follows_page() {
        let api = MockApi::new().with_session(Ok(logged_out()));
        let (storefront, surface) = storefront(&api);

        storefront.load(Page::Catalog).await.unwrap();
        storefront
            .cart()
            .add(ProductId::new(1), "Miele al Tartufo", Price::from_cents(1020))
            .unwrap();
        assert_eq!(surface.text(Region::CartBadge), "Cart (1)");
        assert_eq!(surface.render_count(Region::CartItems), 0);

        storefront.load(Page::Cart).await.unwrap();
        assert!(surface.text(Region::CartItems).contains("Miele al Tartufo"));
        storefront.cart().clear().unwrap();
        assert!(surface.text(Region::CartItems).contains("Your cart is empty."));
        assert_eq!(surface.text(Region::CartTotal), "€0.00");
    }

    #[tokio::test]
    async fn test_profile_logged_out_redirects_without_history() {
        let api = MockApi::new()
            .with_session(Ok(logged_out()))
            .with_history(Ok(vec![order_record(1, 1000)]));
        let (storefront, surface) = storefront(&api);
        // Stale cache from an earlier session.
        storefront.identity().store(&identity("Ada")).unwrap();

        let entry = storefront.open_profile().await.unwrap();

        assert_eq!(entry.redirect(), Some(Page::Login));
        assert_eq!(api.call_count("order_history"), 0);
        assert_eq!(surface.render_count(Region::OrderHistory), 0);
        assert_eq!(storefront.identity().get(), None);
        assert_eq!(
            surface.alerts(),
            vec!["Please login to view your profile and order history.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_profile_logged_in_loads_history() {
        let api = MockApi::new()
            .with_session(Ok(logged_in("Ada")))
            .with_history(Ok(vec![order_record(1, 1000)]));
        let (storefront, surface) = storefront(&api);
        storefront.identity().store(&identity("Ada")).unwrap();

        let profile = storefront.open_profile().await.unwrap().ready().unwrap();

        assert_eq!(profile.user().name, "Ada");
        assert!(surface.text(Region::OrderHistory).contains("Order #1"));
        assert_eq!(api.calls(), vec!["check_session", "order_history"]);
    }

    #[tokio::test]
    async fn test_checkout_requires_cached_identity() {
        // Server session active but nothing cached locally.
        let api = MockApi::new().with_session(Ok(logged_in("Ada")));
        let (storefront, surface) = storefront(&api);

        let entry = storefront.open_checkout(today()).await.unwrap();

        assert_eq!(entry.redirect(), Some(Page::Login));
        assert_eq!(
            surface.alerts(),
            vec!["Please login to schedule your delivery.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_checkout_opens_for_cached_identity() {
        let api = MockApi::new().with_session(Ok(logged_in("Ada")));
        let (storefront, surface) = storefront(&api);
        storefront.identity().store(&identity("Ada")).unwrap();

        let checkout = storefront.open_checkout(today()).await.unwrap().ready();

        assert!(checkout.is_some());
        assert!(
            surface
                .text(Region::OrderSummary)
                .contains("Your cart is empty. Please add items from the catalog.")
        );
    }

    #[tokio::test]
    async fn test_pre_auth_page_redirects_home() {
        let api = MockApi::new().with_session(Ok(logged_in("Ada")));
        let (storefront, _) = storefront(&api);

        let navigation = storefront.load(Page::Login).await.unwrap();
        assert_eq!(navigation, Navigation::Redirect(Page::Home));
    }

    #[tokio::test]
    async fn test_confirmation_page() {
        let api = MockApi::new().with_session(Ok(logged_in("Ada")));
        let (storefront, surface) = storefront(&api);
        crate::confirmation::store_last_order(
            storefront.storage().as_ref(),
            &order_record(5, 1250),
        )
        .unwrap();

        let entry = storefront.open_confirmation().await.unwrap();
        assert_eq!(storefront.page(), Page::OrderConfirmation);
        assert_eq!(entry.ready().flatten().unwrap().id.as_i64(), 5);
        assert!(surface.text(Region::OrderConfirmation).contains("€12.50"));

        let again = storefront.open_confirmation().await.unwrap();
        assert!(matches!(again, PageEntry::Ready(None)));
        assert_eq!(
            surface.text(Region::OrderConfirmation),
            "No recent order found."
        );
    }
}
