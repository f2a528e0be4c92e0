//! Profile page: account details, address update and order history.

use std::sync::Arc;

use askama::Template;
use tracing::{info, instrument, warn};

use crate::api::{OrderRecord, SessionIdentity, TruffleApi};
use crate::error::{AppError, add_breadcrumb};
use crate::session::IdentityCache;
use crate::views::{OrderHistoryTemplate, ProfileDetailsTemplate, ProfileView, Region, Surface, Tone};

/// Drives the profile page of a logged-in user.
pub struct ProfileController<A> {
    api: A,
    identity: IdentityCache,
    surface: Arc<dyn Surface>,
    user: SessionIdentity,
    orders: Vec<OrderRecord>,
}

impl<A: TruffleApi> ProfileController<A> {
    /// Render the account details of `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the details template fails to render.
    pub fn open(
        api: A,
        identity: IdentityCache,
        surface: Arc<dyn Surface>,
        user: SessionIdentity,
    ) -> Result<Self, AppError> {
        let controller = Self {
            api,
            identity,
            surface,
            user,
            orders: Vec::new(),
        };
        controller.render_details()?;
        Ok(controller)
    }

    /// The user shown on the page.
    #[must_use]
    pub const fn user(&self) -> &SessionIdentity {
        &self.user
    }

    /// Orders from the last successful history load.
    #[must_use]
    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    /// Replace the delivery address.
    ///
    /// Returns whether the API accepted it.
    ///
    /// # Errors
    ///
    /// Returns an error if local state cannot be updated after the API
    /// accepted the address.
    #[instrument(skip(self, address))]
    pub async fn update_address(&mut self, address: &str) -> Result<bool, AppError> {
        self.surface.message(Region::AddressMessage, Tone::Info, "");
        add_breadcrumb("profile", "Address update", &[]);

        match self.api.update_address(address).await {
            Ok(()) => {
                self.user.address = Some(address.to_string());
                self.identity.update_address(address)?;
                self.render_details()?;
                self.surface.message(
                    Region::AddressMessage,
                    Tone::Success,
                    "Address updated successfully!",
                );
                info!("Address updated");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Address update failed");
                let text = e.describe("Failed to update address.", "An error occurred.");
                self.surface
                    .message(Region::AddressMessage, Tone::Error, &text);
                Ok(false)
            }
        }
    }

    /// Fetch and render the user's past orders.
    ///
    /// A failed fetch renders a message and keeps the previous orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the history template fails to render.
    #[instrument(skip(self))]
    pub async fn load_order_history(&mut self) -> Result<&[OrderRecord], AppError> {
        self.surface
            .message(Region::OrderHistory, Tone::Info, "Loading order history...");

        let orders = match self.api.order_history().await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "Failed to load order history");
                let detail = e.user_message("Please try again.");
                self.surface.message(
                    Region::OrderHistory,
                    Tone::Error,
                    &format!("Could not load order history: {detail}"),
                );
                return Ok(&self.orders);
            }
        };

        if orders.is_empty() {
            self.surface
                .message(Region::OrderHistory, Tone::Info, "You have no past orders.");
        } else {
            let html = OrderHistoryTemplate::new(&orders).render()?;
            self.surface.replace(Region::OrderHistory, html);
        }
        info!(count = orders.len(), "Order history loaded");
        self.orders = orders;
        Ok(&self.orders)
    }

    fn render_details(&self) -> Result<(), AppError> {
        let html = ProfileDetailsTemplate::from(ProfileView::from(&self.user)).render()?;
        self.surface.replace(Region::ProfileDetails, html);
        Ok(())
    }
}
