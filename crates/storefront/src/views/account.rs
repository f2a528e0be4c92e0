//! Profile page views: account details and order history.

use askama::Template;
use chrono::{DateTime, NaiveDateTime};

use truffle_core::OrderId;

use crate::api::{OrderItemRecord, OrderRecord, SessionIdentity};

/// Account details display data.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl From<&SessionIdentity> for ProfileView {
    fn from(identity: &SessionIdentity) -> Self {
        fn or_na(value: &str) -> String {
            if value.trim().is_empty() {
                "N/A".to_string()
            } else {
                value.to_string()
            }
        }

        Self {
            name: or_na(&identity.name),
            email: or_na(&identity.email),
            address: identity.address().unwrap_or("Not set").to_string(),
        }
    }
}

/// Account details fragment.
#[derive(Template)]
#[template(path = "account/details.html")]
pub struct ProfileDetailsTemplate {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl From<ProfileView> for ProfileDetailsTemplate {
    fn from(view: ProfileView) -> Self {
        Self {
            name: view.name,
            email: view.email,
            address: view.address,
        }
    }
}

/// Order line display data.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&OrderItemRecord> for OrderItemView {
    fn from(item: &OrderItemRecord) -> Self {
        Self {
            name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.price.display(),
            line_price: item.price.times(item.quantity).display(),
        }
    }
}

/// Placed order display data, shared by history and confirmation.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub placed_on: Option<String>,
    pub delivery_date: String,
    pub slot: String,
    pub total: String,
    pub status: String,
    pub pending: bool,
    pub notes: Option<String>,
    pub items: Vec<OrderItemView>,
}

impl From<&OrderRecord> for OrderView {
    fn from(order: &OrderRecord) -> Self {
        Self {
            id: order.id,
            placed_on: order.created_at.as_deref().and_then(placed_on),
            delivery_date: order.delivery_date.clone(),
            slot: order.delivery_slot_description.clone(),
            total: order.total_amount.display(),
            status: order.status.label().to_string(),
            pending: order.status.is_pending(),
            notes: order
                .delivery_notes
                .clone()
                .filter(|n| !n.trim().is_empty()),
            items: order.items.iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Calendar date of an order timestamp, e.g. `19 October 2026`.
///
/// The API sends naive ISO-8601 timestamps; offsets are tolerated. Anything
/// else falls back to the text before the `T`.
fn placed_on(created_at: &str) -> Option<String> {
    let created_at = created_at.trim();
    if created_at.is_empty() {
        return None;
    }

    let date = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| DateTime::parse_from_rfc3339(created_at).map(|dt| dt.date_naive()));

    Some(match date {
        Ok(date) => date.format("%-d %B %Y").to_string(),
        Err(_) => created_at
            .split_once('T')
            .map_or(created_at, |(date, _)| date)
            .to_string(),
    })
}

/// Order history fragment.
#[derive(Template)]
#[template(path = "account/orders.html")]
pub struct OrderHistoryTemplate {
    pub orders: Vec<OrderView>,
}

impl OrderHistoryTemplate {
    #[must_use]
    pub fn new(orders: &[OrderRecord]) -> Self {
        Self {
            orders: orders.iter().map(OrderView::from).collect(),
        }
    }
}
