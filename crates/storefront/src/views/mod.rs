//! View models, templates and the surface they are rendered onto.
//!
//! Controllers never look up UI elements by string id. They render a typed
//! view model through an Askama template and hand the fragment to a
//! [`Surface`] under a [`Region`]. A browser shell maps regions to elements;
//! the CLI and the tests use [`MemorySurface`], which just remembers the last
//! fragment per region.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod nav;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

pub use account::{OrderHistoryTemplate, OrderView, ProfileDetailsTemplate, ProfileView};
pub use cart::{CartItemView, CartRenderer, CartView};
pub use catalog::{ProductGridTemplate, ProductView};
pub use checkout::{ConfirmationTemplate, OrderSummaryTemplate, SlotsTemplate};
pub use nav::NavState;

/// A place on a page that controllers render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Login/register/logout/account controls and the user name.
    Nav,
    /// `Cart (n)` badge in the header.
    CartBadge,
    /// Line-item table on the cart page.
    CartItems,
    CartSubtotal,
    CartTotal,
    /// Product grid on the catalog page.
    ProductGrid,
    /// Cart summary on the checkout page.
    OrderSummary,
    /// Delivery address shown on the checkout page.
    DeliveryAddress,
    /// Selectable delivery slots for the chosen date.
    TimeSlots,
    CheckoutMessage,
    LoginMessage,
    RegisterMessage,
    LogoutMessage,
    /// Name, email and address on the profile page.
    ProfileDetails,
    AddressMessage,
    OrderHistory,
    OrderConfirmation,
}

/// Tone of a form message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

/// Something controllers can render onto.
pub trait Surface: Send + Sync {
    /// Replace the whole content of `region` with an HTML fragment.
    fn replace(&self, region: Region, html: String);

    /// Show a plain-text message in `region`. An empty message clears it.
    fn message(&self, region: Region, tone: Tone, text: &str);

    /// Show a blocking notice to the user.
    fn alert(&self, text: &str);
}

/// Content last rendered into a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionContent {
    Html(String),
    Message { tone: Tone, text: String },
}

impl RegionContent {
    /// The raw text of the content (HTML or message).
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Html(html) => html,
            Self::Message { text, .. } => text,
        }
    }
}

/// A [`Surface`] that records what was rendered.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<MemorySurfaceState>,
}

#[derive(Debug, Default)]
struct MemorySurfaceState {
    regions: HashMap<Region, RegionContent>,
    alerts: Vec<String>,
    renders: HashMap<Region, usize>,
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last content rendered into `region`.
    #[must_use]
    pub fn get(&self, region: Region) -> Option<RegionContent> {
        self.lock().regions.get(&region).cloned()
    }

    /// Text of the last content rendered into `region`, or `""`.
    #[must_use]
    pub fn text(&self, region: Region) -> String {
        self.get(region)
            .map(|c| c.text().to_string())
            .unwrap_or_default()
    }

    /// How many times `region` has been rendered.
    #[must_use]
    pub fn render_count(&self, region: Region) -> usize {
        self.lock().renders.get(&region).copied().unwrap_or(0)
    }

    /// Alerts shown so far, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, region: Region, content: RegionContent) {
        let mut state = self.lock();
        state.regions.insert(region, content);
        *state.renders.entry(region).or_insert(0) += 1;
    }
}

impl Surface for MemorySurface {
    fn replace(&self, region: Region, html: String) {
        self.store(region, RegionContent::Html(html));
    }

    fn message(&self, region: Region, tone: Tone, text: &str) {
        self.store(
            region,
            RegionContent::Message {
                tone,
                text: text.to_string(),
            },
        );
    }

    fn alert(&self, text: &str) {
        tracing::info!(alert = text, "Alert shown");
        self.lock().alerts.push(text.to_string());
    }
}
