//! Checkout page views: order summary, slot picker and confirmation.

use askama::Template;

use truffle_core::SlotId;

use crate::api::{DeliverySlot, OrderRecord};

use super::account::OrderView;
use super::cart::CartView;

/// Cart summary on the checkout page.
#[derive(Template)]
#[template(path = "checkout/summary.html")]
pub struct OrderSummaryTemplate<'a> {
    pub cart: &'a CartView,
}

/// A selectable delivery slot.
#[derive(Debug, Clone)]
pub struct SlotView {
    pub id: SlotId,
    pub time_slot: String,
    pub selected: bool,
}

/// Slot picker fragment for the chosen date.
#[derive(Template)]
#[template(path = "checkout/slots.html")]
pub struct SlotsTemplate {
    pub slots: Vec<SlotView>,
}

impl SlotsTemplate {
    #[must_use]
    pub fn new(slots: &[DeliverySlot], selected: Option<SlotId>) -> Self {
        Self {
            slots: slots
                .iter()
                .map(|slot| SlotView {
                    id: slot.id,
                    time_slot: slot.time_slot.clone(),
                    selected: Some(slot.id) == selected,
                })
                .collect(),
        }
    }
}

/// Placed-order confirmation.
#[derive(Template)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: OrderView,
}

impl From<&OrderRecord> for ConfirmationTemplate {
    fn from(order: &OrderRecord) -> Self {
        Self {
            order: OrderView::from(order),
        }
    }
}
