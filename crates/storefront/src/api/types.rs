//! Request and response bodies of the shop API.

use serde::{Deserialize, Serialize};

use truffle_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, SlotId, UserId};

/// The logged-in user as reported by the API and cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl SessionIdentity {
    /// The address, if one is set and non-blank.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.trim().is_empty())
    }
}

/// Response of `GET /api/check_session`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatus {
    pub logged_in: bool,
    #[serde(default)]
    pub user: Option<SessionIdentity>,
}

impl SessionStatus {
    /// The identity, only when the session is active.
    #[must_use]
    pub fn active_user(self) -> Option<SessionIdentity> {
        if self.logged_in { self.user } else { None }
    }
}

/// Response of `POST /api/login`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    pub user: SessionIdentity,
}

/// Form data for `POST /api/register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: truffle_core::Email,
    pub password: secrecy::SecretString,
    pub address: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A bookable delivery window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySlot {
    pub id: SlotId,
    /// English weekday name, e.g. `"Saturday"`.
    pub day_of_week: String,
    /// Time range, e.g. `"10:00-14:00"`.
    pub time_slot: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One product line of an order request. Prices are decided server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub cart_items: Vec<OrderLineRequest>,
    /// `YYYY-MM-DD`.
    pub delivery_date: String,
    pub delivery_slot_id: SlotId,
    pub delivery_notes: String,
}

/// Response of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlacedOrder {
    pub order: OrderRecord,
}

/// A placed order, as returned by checkout and order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// ISO-8601 timestamp without timezone, e.g. `2026-10-19T09:30:00`.
    #[serde(default)]
    pub created_at: Option<String>,
    pub delivery_date: String,
    pub delivery_slot_description: String,
    pub total_amount: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRecord>,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiMessage {
    pub message: Option<String>,
}
