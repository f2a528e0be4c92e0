//! Scripted [`TruffleApi`] for controller tests.

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::SecretString;
use truffle_core::{Email, OrderId, Price, ProductId, SlotId};

use crate::api::{
    ApiError, DeliverySlot, OrderRecord, OrderRequest, Product, Registration, SessionIdentity,
    SessionStatus, TruffleApi,
};

/// Fake shop API. Unscripted calls fail with a transport error.
#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<&'static str>,
    login: Option<Result<SessionIdentity, ApiError>>,
    register: Option<Result<(), ApiError>>,
    logout: Option<Result<(), ApiError>>,
    session: Option<Result<SessionStatus, ApiError>>,
    products: Option<Result<Vec<Product>, ApiError>>,
    slots: Option<Result<Vec<DeliverySlot>, ApiError>>,
    order: Option<Result<OrderRecord, ApiError>>,
    history: Option<Result<Vec<OrderRecord>, ApiError>>,
    address: Option<Result<(), ApiError>>,
    placed: Vec<OrderRequest>,
    addresses: Vec<String>,
}

fn scripted<T: Clone>(reply: Option<&Result<T, ApiError>>) -> Result<T, ApiError> {
    reply
        .cloned()
        .unwrap_or_else(|| Err(ApiError::Transport("unscripted call".to_string())))
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: &'static str) {
        self.lock().calls.push(call);
    }

    pub fn with_login(self, reply: Result<SessionIdentity, ApiError>) -> Self {
        self.lock().login = Some(reply);
        self
    }

    pub fn with_register(self, reply: Result<(), ApiError>) -> Self {
        self.lock().register = Some(reply);
        self
    }

    pub fn with_logout(self, reply: Result<(), ApiError>) -> Self {
        self.lock().logout = Some(reply);
        self
    }

    pub fn with_session(self, reply: Result<SessionStatus, ApiError>) -> Self {
        self.lock().session = Some(reply);
        self
    }

    pub fn with_products(self, reply: Result<Vec<Product>, ApiError>) -> Self {
        self.lock().products = Some(reply);
        self
    }

    pub fn with_slots(self, reply: Result<Vec<DeliverySlot>, ApiError>) -> Self {
        self.lock().slots = Some(reply);
        self
    }

    pub fn with_order(self, reply: Result<OrderRecord, ApiError>) -> Self {
        self.lock().order = Some(reply);
        self
    }

    pub fn with_history(self, reply: Result<Vec<OrderRecord>, ApiError>) -> Self {
        self.lock().history = Some(reply);
        self
    }

    pub fn with_address(self, reply: Result<(), ApiError>) -> Self {
        self.lock().address = Some(reply);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Order requests received so far.
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.lock().placed.clone()
    }

    /// Addresses received so far.
    pub fn addresses(&self) -> Vec<String> {
        self.lock().addresses.clone()
    }
}

impl TruffleApi for MockApi {
    async fn login(&self, _email: &Email, _password: &SecretString) -> Result<SessionIdentity, ApiError> {
        self.record("login");
        scripted(self.lock().login.as_ref())
    }

    async fn register(&self, _registration: &Registration) -> Result<(), ApiError> {
        self.record("register");
        scripted(self.lock().register.as_ref())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout");
        scripted(self.lock().logout.as_ref())
    }

    async fn check_session(&self) -> Result<SessionStatus, ApiError> {
        self.record("check_session");
        scripted(self.lock().session.as_ref())
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.record("products");
        scripted(self.lock().products.as_ref())
    }

    async fn delivery_slots(&self) -> Result<Vec<DeliverySlot>, ApiError> {
        self.record("delivery_slots");
        scripted(self.lock().slots.as_ref())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderRecord, ApiError> {
        self.record("place_order");
        let mut state = self.lock();
        state.placed.push(order.clone());
        scripted(state.order.as_ref())
    }

    async fn order_history(&self) -> Result<Vec<OrderRecord>, ApiError> {
        self.record("order_history");
        scripted(self.lock().history.as_ref())
    }

    async fn update_address(&self, address: &str) -> Result<(), ApiError> {
        self.record("update_address");
        let mut state = self.lock();
        state.addresses.push(address.to_string());
        scripted(state.address.as_ref())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn identity(name: &str) -> SessionIdentity {
    SessionIdentity {
        id: None,
        name: name.to_string(),
        email: format!("{}@truffle.shop", name.to_lowercase()),
        address: Some("Via Roma 1, Alba".to_string()),
    }
}

pub fn logged_in(name: &str) -> SessionStatus {
    SessionStatus {
        logged_in: true,
        user: Some(identity(name)),
    }
}

pub fn logged_out() -> SessionStatus {
    SessionStatus {
        logged_in: false,
        user: None,
    }
}

pub fn rejected(status: u16, message: &str) -> ApiError {
    ApiError::Rejected {
        status,
        message: Some(message.to_string()),
    }
}

pub fn product(id: i64, name: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: None,
        price: Price::from_cents(cents),
        image_url: None,
    }
}

/// Two days with three windows each, like the seeded backend.
pub fn weekend_slots() -> Vec<DeliverySlot> {
    let mut slots = Vec::new();
    let mut id = 1;
    for day in ["Saturday", "Sunday"] {
        for window in ["10:00-14:00", "14:00-18:00", "18:00-21:00"] {
            slots.push(DeliverySlot {
                id: SlotId::new(id),
                day_of_week: day.to_string(),
                time_slot: window.to_string(),
                description: None,
            });
            id += 1;
        }
    }
    slots
}

pub fn order_record(id: i64, cents: i64) -> OrderRecord {
    OrderRecord {
        id: OrderId::new(id),
        user_id: None,
        customer_name: Some("Ada".to_string()),
        created_at: Some("2026-10-19T09:30:00".to_string()),
        delivery_date: "2026-10-24".to_string(),
        delivery_slot_description: "Saturday 10:00-14:00".to_string(),
        total_amount: Price::from_cents(cents),
        status: truffle_core::OrderStatus::Pending,
        delivery_notes: None,
        items: Vec::new(),
    }
}
