//! In-process fake of the shop API.
//!
//! Serves the same routes, status codes and `{"message": ...}` error bodies as
//! the real backend, backed by in-memory tables and `tower-sessions` cookie
//! sessions. Every request path is recorded so tests can assert which calls
//! the client made.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use url::Url;

const USER_ID_KEY: &str = "user_id";
const GENERATION_KEY: &str = "generation";

#[derive(Debug, Clone)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    address: Option<String>,
}

impl UserRow {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "address": self.address,
        })
    }
}

#[derive(Debug, Clone)]
struct ProductRow {
    id: i64,
    name: &'static str,
    description: &'static str,
    price: f64,
    image_url: &'static str,
}

#[derive(Debug, Clone)]
struct SlotRow {
    id: i64,
    day: &'static str,
    time: &'static str,
}

impl SlotRow {
    fn description(&self) -> String {
        format!("{} {}", self.day, self.time)
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserRow>,
    products: Vec<ProductRow>,
    slots: Vec<SlotRow>,
    orders: Vec<Value>,
    next_item_id: i64,
    /// Sessions issued under an older generation are no longer honoured.
    generation: u64,
    hits: Vec<String>,
}

struct BackendState {
    tables: Mutex<Tables>,
    delay: Duration,
    today: NaiveDate,
}

impl BackendState {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type SharedState = Arc<BackendState>;

/// A running fake shop API bound to a loopback port.
///
/// The server task is aborted when the value is dropped.
pub struct FakeBackend {
    state: SharedState,
    base_url: Url,
    server: JoinHandle<()>,
}

impl FakeBackend {
    #[must_use]
    pub fn builder() -> FakeBackendBuilder {
        FakeBackendBuilder::default()
    }

    /// Base URL to point the API client at.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// How many requests were made to `path`.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.state.tables().hits.iter().filter(|p| *p == path).count()
    }

    /// Invalidate every session issued so far, as a server restart would.
    pub fn expire_sessions(&self) {
        self.state.tables().generation += 1;
    }

    /// All placed orders, oldest first, as returned on the wire.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.state.tables().orders.clone()
    }

    /// Stored address of the user with `email`.
    #[must_use]
    pub fn address_of(&self, email: &str) -> Option<String> {
        self.state
            .tables()
            .users
            .iter()
            .find(|u| u.email == email)
            .and_then(|u| u.address.clone())
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Configures and starts a [`FakeBackend`].
#[derive(Debug, Default)]
pub struct FakeBackendBuilder {
    users: Vec<(String, String, String, Option<String>)>,
    delay: Duration,
    today: Option<NaiveDate>,
}

impl FakeBackendBuilder {
    /// Seed a registered user.
    #[must_use]
    pub fn user(mut self, name: &str, email: &str, password: &str, address: Option<&str>) -> Self {
        self.users.push((
            name.to_string(),
            email.to_string(),
            password.to_string(),
            address.map(str::to_string),
        ));
        self
    }

    /// Delay every response by `delay`.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The server's notion of today, used to refuse past delivery dates.
    /// Defaults to the local date.
    #[must_use]
    pub const fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Bind a loopback port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no loopback port can be bound.
    pub async fn start(self) -> FakeBackend {
        let users = self
            .users
            .into_iter()
            .zip(1..)
            .map(|((name, email, password, address), id)| UserRow {
                id,
                name,
                email,
                password,
                address,
            })
            .collect();

        let state = Arc::new(BackendState {
            tables: Mutex::new(Tables {
                users,
                products: seed_products(),
                slots: seed_slots(),
                next_item_id: 1,
                ..Tables::default()
            }),
            delay: self.delay,
            today: self
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        });

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind fake backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read fake backend address");

        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        FakeBackend {
            state,
            base_url: Url::parse(&format!("http://{addr}")).expect("Loopback address is a valid URL"),
            server,
        }
    }
}

fn seed_products() -> Vec<ProductRow> {
    vec![
        ProductRow {
            id: 1,
            name: "Salsa al Tartufo Nero",
            description: "Sapore ricco e terroso",
            price: 15.99,
            image_url: "https://truffle.shop/img/salsa.jpg",
        },
        ProductRow {
            id: 2,
            name: "Olio al Tartufo Bianco",
            description: "Aroma delicato",
            price: 12.50,
            image_url: "https://truffle.shop/img/olio.jpg",
        },
        ProductRow {
            id: 3,
            name: "Sale al Tartufo",
            description: "Migliora qualsiasi piatto",
            price: 8.75,
            image_url: "https://truffle.shop/img/sale.jpg",
        },
        ProductRow {
            id: 4,
            name: "Miele al Tartufo",
            description: "Dolce e salato",
            price: 10.20,
            image_url: "",
        },
    ]
}

fn seed_slots() -> Vec<SlotRow> {
    let windows = ["10:00-14:00", "14:00-18:00", "18:00-21:00"];
    ["Saturday", "Sunday"]
        .into_iter()
        .flat_map(|day| windows.into_iter().map(move |time| (day, time)))
        .zip(1..)
        .map(|((day, time), id)| SlotRow { id, day, time })
        .collect()
}

fn router(state: SharedState) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name("truffle_session")
        .with_secure(false);

    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/check_session", get(check_session))
        .route("/api/user/address", put(update_address))
        .route("/api/products", get(products))
        .route("/api/delivery-slots", get(delivery_slots))
        .route("/api/orders", post(place_order))
        .route("/api/orders/history", get(order_history))
        .layer(sessions)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            record_and_delay,
        ))
        .with_state(state)
}

async fn record_and_delay(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    state.tables().hits.push(request.uri().path().to_string());
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    next.run(request).await
}

// =============================================================================
// Helpers
// =============================================================================

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn text_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// The logged-in user id, if the session is current.
async fn session_user(state: &BackendState, session: &Session) -> Option<i64> {
    let user_id = session.get::<i64>(USER_ID_KEY).await.ok().flatten()?;
    let generation = session.get::<u64>(GENERATION_KEY).await.ok().flatten()?;
    (generation == state.tables().generation).then_some(user_id)
}

fn auth_required() -> Response {
    message(StatusCode::UNAUTHORIZED, "Authentication required")
}

// =============================================================================
// Auth
// =============================================================================

async fn register(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let (Some(name), Some(email), Some(_)) = (
        text_field(&body, "name"),
        text_field(&body, "email"),
        text_field(&body, "password"),
    ) else {
        return message(StatusCode::BAD_REQUEST, "Missing name, email, or password");
    };

    let mut tables = state.tables();
    if tables.users.iter().any(|u| u.email == email) {
        return message(StatusCode::CONFLICT, "Email already registered");
    }
    let user = UserRow {
        id: i64::try_from(tables.users.len()).unwrap_or(i64::MAX) + 1,
        name: name.to_string(),
        email: email.to_string(),
        password: text_field(&body, "password").unwrap_or_default().to_string(),
        address: Some(text_field(&body, "address").unwrap_or_default().to_string()),
    };
    let response = json!({ "message": "User registered successfully", "user": user.to_json() });
    tables.users.push(user);
    drop(tables);

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn login(State(state): State<SharedState>, session: Session, Json(body): Json<Value>) -> Response {
    let (Some(email), Some(password)) = (text_field(&body, "email"), text_field(&body, "password"))
    else {
        return message(StatusCode::BAD_REQUEST, "Missing email or password");
    };

    let user = state
        .tables()
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned();
    let Some(user) = user else {
        return message(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    let generation = state.tables().generation;
    if session.insert(USER_ID_KEY, user.id).await.is_err()
        || session.insert(GENERATION_KEY, generation).await.is_err()
    {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Session error");
    }

    Json(json!({ "message": "Login successful", "user": user.to_json() })).into_response()
}

async fn logout(State(state): State<SharedState>, session: Session) -> Response {
    if session_user(&state, &session).await.is_none() {
        return auth_required();
    }
    let _ = session.flush().await;
    Json(json!({ "message": "Logout successful" })).into_response()
}

async fn check_session(State(state): State<SharedState>, session: Session) -> Response {
    let Some(user_id) = session_user(&state, &session).await else {
        return Json(json!({ "logged_in": false })).into_response();
    };

    let user = state.tables().users.iter().find(|u| u.id == user_id).cloned();
    match user {
        Some(user) => Json(json!({ "logged_in": true, "user": user.to_json() })).into_response(),
        None => {
            let _ = session.flush().await;
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "logged_in": false, "message": "User not found, session cleared" })),
            )
                .into_response()
        }
    }
}

async fn update_address(
    State(state): State<SharedState>,
    session: Session,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = session_user(&state, &session).await else {
        return auth_required();
    };
    let Some(address) = body.get("address").and_then(Value::as_str) else {
        return message(StatusCode::BAD_REQUEST, "Missing address field");
    };

    let mut tables = state.tables();
    let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    user.address = Some(address.to_string());
    let response = json!({ "message": "Address updated successfully", "user": user.to_json() });
    drop(tables);

    Json(response).into_response()
}

// =============================================================================
// Catalog
// =============================================================================

async fn products(State(state): State<SharedState>) -> Response {
    let products: Vec<Value> = state
        .tables()
        .products
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "description": p.description,
                "price": p.price,
                "image_url": p.image_url,
            })
        })
        .collect();
    Json(products).into_response()
}

async fn delivery_slots(State(state): State<SharedState>) -> Response {
    let slots: Vec<Value> = state
        .tables()
        .slots
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "day_of_week": s.day,
                "time_slot": s.time,
                "description": s.description(),
            })
        })
        .collect();
    Json(slots).into_response()
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
struct OrderBody {
    cart_items: Vec<OrderLineBody>,
    delivery_date: String,
    delivery_slot_id: i64,
    #[serde(default)]
    delivery_notes: String,
}

#[derive(Debug, Deserialize)]
struct OrderLineBody {
    product_id: Option<i64>,
    quantity: Option<i64>,
}

async fn place_order(
    State(state): State<SharedState>,
    session: Session,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = session_user(&state, &session).await else {
        return auth_required();
    };
    let Ok(order) = serde_json::from_value::<OrderBody>(body) else {
        return message(
            StatusCode::BAD_REQUEST,
            "Missing required fields (cart_items, delivery_date, delivery_slot_id)",
        );
    };
    if order.cart_items.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Cart cannot be empty");
    }

    let Ok(date) = NaiveDate::parse_from_str(&order.delivery_date, "%Y-%m-%d") else {
        return message(
            StatusCode::BAD_REQUEST,
            "Invalid delivery date format. Use YYYY-MM-DD.",
        );
    };
    if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return message(
            StatusCode::BAD_REQUEST,
            "Delivery is only available on Saturdays and Sundays.",
        );
    }
    if date < state.today {
        return message(StatusCode::BAD_REQUEST, "Delivery date cannot be in the past.");
    }

    let mut tables = state.tables();
    let Some(slot) = tables
        .slots
        .iter()
        .find(|s| s.id == order.delivery_slot_id)
        .cloned()
    else {
        return message(StatusCode::BAD_REQUEST, "Invalid delivery slot ID.");
    };
    let day_name = date.format("%A").to_string();
    if slot.day != day_name {
        return message(
            StatusCode::BAD_REQUEST,
            &format!("Selected slot is for {}, but date is a {day_name}.", slot.day),
        );
    }

    let mut total = 0.0;
    let mut items = Vec::with_capacity(order.cart_items.len());
    for line in &order.cart_items {
        let product = line
            .product_id
            .and_then(|id| tables.products.iter().find(|p| p.id == id));
        let (Some(product), Some(quantity)) = (product, line.quantity.filter(|q| *q > 0)) else {
            let id = line
                .product_id
                .map_or_else(|| "None".to_string(), |id| id.to_string());
            return message(
                StatusCode::BAD_REQUEST,
                &format!("Invalid product or quantity for product ID {id}"),
            );
        };
        #[allow(clippy::cast_precision_loss)]
        {
            total += product.price * quantity as f64;
        }
        items.push((product.id, product.name, quantity, product.price));
    }

    let order_id = tables.orders.len() + 1;
    let items: Vec<Value> = items
        .into_iter()
        .map(|(product_id, product_name, quantity, price)| {
            let id = tables.next_item_id;
            tables.next_item_id += 1;
            json!({
                "id": id,
                "order_id": order_id,
                "product_id": product_id,
                "product_name": product_name,
                "quantity": quantity,
                "price": price,
            })
        })
        .collect();
    let customer_name = tables
        .users
        .iter()
        .find(|u| u.id == user_id)
        .map_or_else(|| "N/A".to_string(), |u| u.name.clone());

    let record = json!({
        "id": order_id,
        "user_id": user_id,
        "customer_name": customer_name,
        "created_at": state.today.and_hms_opt(9, 30, 0).map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        "delivery_date": order.delivery_date,
        "delivery_slot_description": slot.description(),
        "total_amount": (total * 100.0).round() / 100.0,
        "status": "Pending",
        "delivery_notes": order.delivery_notes,
        "items": items,
    });
    tables.orders.push(record.clone());
    drop(tables);

    (
        StatusCode::CREATED,
        Json(json!({ "message": "Order placed successfully", "order": record })),
    )
        .into_response()
}

async fn order_history(State(state): State<SharedState>, session: Session) -> Response {
    let Some(user_id) = session_user(&state, &session).await else {
        return auth_required();
    };
    let orders: Vec<Value> = state
        .tables()
        .orders
        .iter()
        .rev()
        .filter(|o| o.get("user_id").and_then(Value::as_i64) == Some(user_id))
        .cloned()
        .collect();
    Json(orders).into_response()
}
