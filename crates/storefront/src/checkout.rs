//! Checkout flow: delivery date, slot and notes, then order submission.
//!
//! ```text
//! AwaitingDate -> AwaitingSlot -> ReadyToSubmit -> Submitting -> Succeeded
//!                                       ^                    |
//!                                       +------ Failed <-----+
//! ```
//!
//! The selection lives only as long as the controller. Submission is
//! validated locally first; a violation never reaches the network.

use std::sync::Arc;

use askama::Template;
use chrono::{Datelike, NaiveDate};
use tracing::{error, info, instrument, warn};

use truffle_core::{DeliveryDays, SlotId, weekday_name};

use crate::api::{DeliverySlot, OrderLineRequest, OrderRequest, SessionIdentity, TruffleApi};
use crate::cart::CartStore;
use crate::confirmation::store_last_order;
use crate::error::{AppError, add_breadcrumb};
use crate::page::{Navigation, Page};
use crate::state::Storefront;
use crate::storage::KeyValueStore;
use crate::views::{CartView, OrderSummaryTemplate, Region, SlotsTemplate, Surface, Tone};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where the checkout page stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// No usable date yet (none chosen, or one outside the delivery days).
    AwaitingDate,
    /// A delivery date is chosen; slots are shown for it.
    AwaitingSlot,
    /// Date and slot chosen.
    ReadyToSubmit,
    /// Order request in flight.
    Submitting,
    /// Order placed.
    Succeeded,
    /// Order refused or unreachable. Transient: the controller returns to
    /// `ReadyToSubmit` once the failure is shown.
    Failed,
}

/// The delivery choice being built on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverySelection {
    pub date: Option<NaiveDate>,
    pub slot: Option<SlotId>,
    pub notes: String,
}

/// Drives the checkout page of a logged-in user.
pub struct CheckoutController<A> {
    api: A,
    cart: CartStore,
    storage: Arc<dyn KeyValueStore>,
    surface: Arc<dyn Surface>,
    delivery_days: DeliveryDays,
    user: SessionIdentity,
    today: NaiveDate,
    selection: DeliverySelection,
    offered: Vec<DeliverySlot>,
    state: CheckoutState,
}

impl<A: TruffleApi> CheckoutController<A> {
    /// Render the order summary and delivery address.
    ///
    /// `today` is the local calendar day; earlier dates are refused.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary template fails to render.
    pub fn open(
        storefront: &Storefront<A>,
        user: SessionIdentity,
        today: NaiveDate,
    ) -> Result<Self, AppError> {
        let controller = Self {
            api: storefront.api().clone(),
            cart: storefront.cart().clone(),
            storage: Arc::clone(storefront.storage()),
            surface: Arc::clone(storefront.surface()),
            delivery_days: storefront.delivery_days().clone(),
            user,
            today,
            selection: DeliverySelection::default(),
            offered: Vec::new(),
            state: CheckoutState::AwaitingDate,
        };

        controller.render_summary()?;
        let address = controller
            .user
            .address()
            .unwrap_or("No address set. Please update in your profile.");
        controller
            .surface
            .message(Region::DeliveryAddress, Tone::Info, address);
        Ok(controller)
    }

    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    #[must_use]
    pub const fn selection(&self) -> &DeliverySelection {
        &self.selection
    }

    /// Slots offered for the chosen date.
    #[must_use]
    pub fn offered_slots(&self) -> &[DeliverySlot] {
        &self.offered
    }

    /// Earliest selectable delivery date.
    #[must_use]
    pub const fn min_date(&self) -> NaiveDate {
        self.today
    }

    /// Handle a change of the date input (`YYYY-MM-DD`, empty to clear).
    ///
    /// Dates outside the delivery days show the policy message without a
    /// network call. Otherwise the day's slots are fetched and rendered.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot picker fails to render.
    #[instrument(skip(self))]
    pub async fn select_date(&mut self, raw: &str) -> Result<(), AppError> {
        self.selection.date = None;
        self.selection.slot = None;
        self.offered.clear();
        self.state = CheckoutState::AwaitingDate;
        self.surface.message(Region::CheckoutMessage, Tone::Info, "");
        self.surface.replace(Region::TimeSlots, String::new());

        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) else {
            self.surface.message(
                Region::CheckoutMessage,
                Tone::Error,
                "Please select a delivery date.",
            );
            return Ok(());
        };
        if date < self.min_date() {
            self.surface.message(
                Region::CheckoutMessage,
                Tone::Error,
                "Delivery date cannot be in the past.",
            );
            return Ok(());
        }

        self.selection.date = Some(date);
        if !self.delivery_days.allows(date) {
            self.surface.message(
                Region::TimeSlots,
                Tone::Error,
                &self.delivery_days.policy_message(),
            );
            return Ok(());
        }

        self.state = CheckoutState::AwaitingSlot;
        let day = weekday_name(date.weekday());
        match self.api.delivery_slots().await {
            Ok(slots) => {
                self.offered = slots
                    .into_iter()
                    .filter(|slot| slot.day_of_week == day)
                    .collect();
                if self.offered.is_empty() {
                    self.surface.message(
                        Region::TimeSlots,
                        Tone::Info,
                        "No delivery slots available for this day.",
                    );
                } else {
                    let html = SlotsTemplate::new(&self.offered, None).render()?;
                    self.surface.replace(Region::TimeSlots, html);
                }
                info!(%date, day, slots = self.offered.len(), "Delivery slots shown");
            }
            Err(e) => {
                warn!(error = %e, "Failed to load delivery slots");
                let detail = e.user_message("Please try again.");
                self.surface.message(
                    Region::TimeSlots,
                    Tone::Error,
                    &format!("Could not load delivery slots. {detail}"),
                );
            }
        }
        Ok(())
    }

    /// Handle a slot choice. Only slots offered for the chosen date count.
    ///
    /// Returns whether the slot was accepted.
    pub fn select_slot(&mut self, slot: SlotId) -> bool {
        let offered = self.selection.date.is_some() && self.offered.iter().any(|s| s.id == slot);
        if !offered {
            warn!(slot = %slot, "Ignoring slot not offered for the chosen date");
            return false;
        }
        self.selection.slot = Some(slot);
        self.state = CheckoutState::ReadyToSubmit;
        true
    }

    /// Set the free-text delivery notes.
    pub fn set_notes(&mut self, notes: &str) {
        notes.clone_into(&mut self.selection.notes);
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.state == CheckoutState::ReadyToSubmit && !self.cart.get().is_empty()
    }

    /// Place the order.
    ///
    /// On success the cart is cleared, the order stored for the confirmation
    /// page and the user sent there. A snapshot that cannot be stored is
    /// logged; the confirmation page then reports no recent order. On failure
    /// the message is shown, the cart is untouched and the controller is
    /// ready to submit again.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart cannot be cleared after the order
    /// was placed.
    #[instrument(skip(self), fields(user = %self.user.email))]
    pub async fn submit(&mut self) -> Result<Navigation, AppError> {
        self.surface.message(Region::CheckoutMessage, Tone::Info, "");

        let (request, date) = match self.validate() {
            Ok(valid) => valid,
            Err(text) => {
                self.surface
                    .message(Region::CheckoutMessage, Tone::Error, &text);
                return Ok(Navigation::Stay);
            }
        };

        self.state = CheckoutState::Submitting;
        add_breadcrumb(
            "checkout",
            "Order submitted",
            &[
                ("delivery_date", &request.delivery_date),
                ("delivery_slot_id", &request.delivery_slot_id.to_string()),
            ],
        );

        match self.api.place_order(&request).await {
            Ok(order) => {
                self.state = CheckoutState::Succeeded;
                info!(order_id = %order.id, %date, total = %order.total_amount, "Order placed");
                self.cart.clear()?;
                if let Err(e) = store_last_order(self.storage.as_ref(), &order) {
                    error!(order_id = %order.id, error = %e, "Failed to store last-order snapshot");
                }
                Ok(Navigation::Redirect(Page::OrderConfirmation))
            }
            Err(e) => {
                self.state = CheckoutState::Failed;
                warn!(error = %e, "Order placement failed");
                let text = e.describe(
                    "Failed to place order.",
                    &format!("An error occurred while placing your order: {e}"),
                );
                self.surface
                    .message(Region::CheckoutMessage, Tone::Error, &text);
                self.state = CheckoutState::ReadyToSubmit;
                Ok(Navigation::Stay)
            }
        }
    }

    /// Check the selection against the cart and the delivery policy.
    fn validate(&self) -> Result<(OrderRequest, NaiveDate), String> {
        let cart = self.cart.get();
        if cart.is_empty() {
            return Err("Your cart is empty.".to_string());
        }
        let Some(date) = self.selection.date else {
            return Err("Please select a delivery date.".to_string());
        };
        if date < self.min_date() {
            return Err("Delivery date cannot be in the past.".to_string());
        }
        if !self.delivery_days.allows(date) {
            return Err(self.delivery_days.policy_message());
        }
        let Some(slot) = self.selection.slot else {
            return Err("Please select a delivery time slot.".to_string());
        };

        let request = OrderRequest {
            cart_items: cart
                .lines()
                .iter()
                .map(|line| OrderLineRequest {
                    product_id: line.id,
                    quantity: line.quantity,
                })
                .collect(),
            delivery_date: date.format(DATE_FORMAT).to_string(),
            delivery_slot_id: slot,
            delivery_notes: self.selection.notes.trim().to_string(),
        };
        Ok((request, date))
    }

    fn render_summary(&self) -> Result<(), AppError> {
        let view = CartView::from(&self.cart.get());
        let html = OrderSummaryTemplate { cart: &view }.render()?;
        self.surface.replace(Region::OrderSummary, html);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Weekday;
    use truffle_core::{Price, ProductId};

    use super::*;
    use crate::api::ApiError;
    use crate::confirmation::take_last_order;
    use crate::storage::{MemoryStore, StorageError, keys};
    use crate::test_support::{MockApi, identity, order_record, rejected, weekend_slots};
    use crate::views::MemorySurface;

    const MONDAY: &str = "2026-10-19";
    const FRIDAY: &str = "2026-10-23";
    const SATURDAY: &str = "2026-10-24";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn setup(api: &MockApi) -> (Storefront<MockApi>, Arc<MemorySurface>) {
        setup_with(api, Arc::new(MemoryStore::new()))
    }

    fn setup_with(
        api: &MockApi,
        storage: Arc<dyn KeyValueStore>,
    ) -> (Storefront<MockApi>, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        let storefront = Storefront::new(
            api.clone(),
            storage,
            surface.clone(),
            DeliveryDays::default(),
        );
        (storefront, surface)
    }

    /// Memory store whose disk is full for the last-order snapshot.
    struct SnapshotFullStore(MemoryStore);

    impl KeyValueStore for SnapshotFullStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == keys::LAST_ORDER {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("no space left on device"),
                });
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    /// Two lines totalling €30.00.
    fn fill_cart(cart: &CartStore) {
        cart.add(ProductId::new(1), "Olio al Tartufo Bianco", Price::from_cents(1250))
            .unwrap();
        cart.add(ProductId::new(2), "Sale al Tartufo", Price::from_cents(875))
            .unwrap();
        cart.set_quantity(ProductId::new(2), 2).unwrap();
        assert_eq!(cart.total(), Price::from_cents(3000));
    }

    fn open(storefront: &Storefront<MockApi>) -> CheckoutController<MockApi> {
        CheckoutController::open(storefront, identity("Ada"), today()).unwrap()
    }

    #[test]
    fn test_open_renders_summary_and_address() {
        let api = MockApi::new();
        let (storefront, surface) = setup(&api);
        fill_cart(storefront.cart());

        let checkout = open(&storefront);

        assert_eq!(checkout.state(), CheckoutState::AwaitingDate);
        assert_eq!(checkout.min_date(), today());
        assert!(surface.text(Region::OrderSummary).contains("Total: €30.00"));
        assert_eq!(surface.text(Region::DeliveryAddress), "Via Roma 1, Alba");
    }

    #[tokio::test]
    async fn test_weekday_date_shows_policy_without_network() {
        let api = MockApi::new().with_slots(Ok(weekend_slots()));
        let (storefront, surface) = setup(&api);
        fill_cart(storefront.cart());
        let mut checkout = open(&storefront);

        checkout.select_date(MONDAY).await.unwrap();
        assert_eq!(
            surface.text(Region::TimeSlots),
            "Delivery only available on Saturdays and Sundays."
        );
        assert_eq!(checkout.state(), CheckoutState::AwaitingDate);

        let navigation = checkout.submit().await.unwrap();

        assert_eq!(navigation, Navigation::Stay);
        assert_eq!(
            surface.text(Region::CheckoutMessage),
            "Delivery only available on Saturdays and Sundays."
        );
        assert!(api.calls().is_empty());
        assert_eq!(storefront.cart().total(), Price::from_cents(3000));
    }

    #[tokio::test]
    async fn test_past_date_rejected() {
        let api = MockApi::new();
        let (storefront, surface) = setup(&api);
        let mut checkout = open(&storefront);

        checkout.select_date("2026-10-18").await.unwrap();

        assert_eq!(checkout.selection().date, None);
        assert_eq!(
            surface.text(Region::CheckoutMessage),
            "Delivery date cannot be in the past."
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_weekend_date_offers_that_days_slots() {
        let api = MockApi::new().with_slots(Ok(weekend_slots()));
        let (storefront, surface) = setup(&api);
        let mut checkout = open(&storefront);

        checkout.select_date(SATURDAY).await.unwrap();

        assert_eq!(checkout.state(), CheckoutState::AwaitingSlot);
        assert_eq!(checkout.offered_slots().len(), 3);
        assert!(
            checkout
                .offered_slots()
                .iter()
                .all(|s| s.day_of_week == "Saturday")
        );
        assert_eq!(
            surface
                .text(Region::TimeSlots)
                .matches(r#"name="delivery_slot_id""#)
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn test_configured_day_without_slots() {
        let api = MockApi::new().with_slots(Ok(weekend_slots()));
        let surface = Arc::new(MemorySurface::new());
        let days = DeliveryDays::new([Weekday::Fri, Weekday::Sat]).unwrap();
        let storefront = Storefront::new(
            api.clone(),
            Arc::new(MemoryStore::new()),
            surface.clone(),
            days,
        );
        let mut checkout = open(&storefront);

        checkout.select_date(FRIDAY).await.unwrap();

        assert_eq!(
            surface.text(Region::TimeSlots),
            "No delivery slots available for this day."
        );
        assert!(!checkout.select_slot(SlotId::new(1)));
    }

    #[tokio::test]
    async fn test_slot_fetch_failure() {
        let api = MockApi::new().with_slots(Err(ApiError::Timeout(Duration::from_secs(15))));
        let (storefront, surface) = setup(&api);
        let mut checkout = open(&storefront);

        checkout.select_date(SATURDAY).await.unwrap();

        assert_eq!(
            surface.text(Region::TimeSlots),
            "Could not load delivery slots. The request timed out. Please try again."
        );
    }

    #[tokio::test]
    async fn test_slot_must_be_offered_for_date() {
        let api = MockApi::new().with_slots(Ok(weekend_slots()));
        let (storefront, _) = setup(&api);
        fill_cart(storefront.cart());
        let mut checkout = open(&storefront);

        assert!(!checkout.select_slot(SlotId::new(1)));

        checkout.select_date(SATURDAY).await.unwrap();
        // Slot 4 is a Sunday slot.
        assert!(!checkout.select_slot(SlotId::new(4)));
        assert!(!checkout.can_submit());

        assert!(checkout.select_slot(SlotId::new(2)));
        assert_eq!(checkout.state(), CheckoutState::ReadyToSubmit);
        assert!(checkout.can_submit());
    }

    #[tokio::test]
    async fn test_submit_validation_order() {
        let api = MockApi::new().with_slots(Ok(weekend_slots()));
        let (storefront, surface) = setup(&api);
        let mut checkout = open(&storefront);

        checkout.submit().await.unwrap();
        assert_eq!(surface.text(Region::CheckoutMessage), "Your cart is empty.");

        fill_cart(storefront.cart());
        checkout.submit().await.unwrap();
        assert_eq!(
            surface.text(Region::CheckoutMessage),
            "Please select a delivery date."
        );

        checkout.select_date(SATURDAY).await.unwrap();
        checkout.submit().await.unwrap();
        assert_eq!(
            surface.text(Region::CheckoutMessage),
            "Please select a delivery time slot."
        );

        assert_eq!(api.call_count("place_order"), 0);
    }

    #[tokio::test]
    async fn test_successful_submit() {
        let api = MockApi::new()
            .with_slots(Ok(weekend_slots()))
            .with_order(Ok(order_record(17, 3000)));
        let (storefront, _) = setup(&api);
        fill_cart(storefront.cart());
        let mut checkout = open(&storefront);

        checkout.select_date(SATURDAY).await.unwrap();
        assert!(checkout.select_slot(SlotId::new(1)));
        checkout.set_notes("  Leave with the concierge ");

        let navigation = checkout.submit().await.unwrap();

        assert_eq!(navigation, Navigation::Redirect(Page::OrderConfirmation));
        assert_eq!(checkout.state(), CheckoutState::Succeeded);
        assert!(storefront.cart().get().is_empty());

        let placed = api.placed_orders();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].delivery_date, SATURDAY);
        assert_eq!(placed[0].delivery_slot_id, SlotId::new(1));
        assert_eq!(placed[0].delivery_notes, "Leave with the concierge");
        assert_eq!(placed[0].cart_items.len(), 2);
        assert_eq!(placed[0].cart_items[1].quantity, 2);

        let stored = take_last_order(storefront.storage().as_ref()).unwrap();
        assert_eq!(stored.id.as_i64(), 17);
    }

    #[tokio::test]
    async fn test_snapshot_failure_still_clears_cart() {
        let api = MockApi::new()
            .with_slots(Ok(weekend_slots()))
            .with_order(Ok(order_record(18, 3000)));
        let (storefront, _) = setup_with(&api, Arc::new(SnapshotFullStore(MemoryStore::new())));
        fill_cart(storefront.cart());
        let mut checkout = open(&storefront);

        checkout.select_date(SATURDAY).await.unwrap();
        assert!(checkout.select_slot(SlotId::new(2)));
        let navigation = checkout.submit().await.unwrap();

        assert_eq!(navigation, Navigation::Redirect(Page::OrderConfirmation));
        assert_eq!(checkout.state(), CheckoutState::Succeeded);
        assert!(storefront.cart().get().is_empty());
        assert!(!checkout.can_submit());
        assert_eq!(api.placed_orders().len(), 1);
        assert_eq!(take_last_order(storefront.storage().as_ref()), None);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_cart() {
        let api = MockApi::new()
            .with_slots(Ok(weekend_slots()))
            .with_order(Err(rejected(409, "Slot no longer available")));
        let (storefront, surface) = setup(&api);
        fill_cart(storefront.cart());
        let before = storefront.cart().get();
        let mut checkout = open(&storefront);

        checkout.select_date(SATURDAY).await.unwrap();
        assert!(checkout.select_slot(SlotId::new(3)));
        let navigation = checkout.submit().await.unwrap();

        assert_eq!(navigation, Navigation::Stay);
        assert_eq!(storefront.cart().get(), before);
        assert_eq!(
            surface.text(Region::CheckoutMessage),
            "Slot no longer available"
        );
        assert_eq!(checkout.state(), CheckoutState::ReadyToSubmit);
        assert_eq!(take_last_order(storefront.storage().as_ref()), None);
    }

    #[tokio::test]
    async fn test_unreachable_submit_message() {
        let api = MockApi::new().with_slots(Ok(weekend_slots()));
        let (storefront, surface) = setup(&api);
        fill_cart(storefront.cart());
        let mut checkout = open(&storefront);

        checkout.select_date(SATURDAY).await.unwrap();
        checkout.select_slot(SlotId::new(1));
        checkout.submit().await.unwrap();

        assert!(
            surface
                .text(Region::CheckoutMessage)
                .starts_with("An error occurred while placing your order: ")
        );
    }
}
