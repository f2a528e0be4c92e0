//! `reqwest` implementation of [`TruffleApi`].
//!
//! Sessions are cookie-based, so the client keeps a cookie jar for its whole
//! lifetime. The product list is cached using `moka` for a short TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use truffle_core::Email;

use super::types::{ApiMessage, LoginResponse, PlacedOrder};
use super::{
    ApiError, DeliverySlot, OrderRecord, OrderRequest, Product, Registration, SessionIdentity,
    SessionStatus, TruffleApi,
};
use crate::config::ApiConfig;

const PRODUCTS_CACHE_KEY: &str = "products";

/// HTTP client for the shop API.
#[derive(Clone)]
pub struct HttpApiClient {
    inner: Arc<HttpApiClientInner>,
}

struct HttpApiClientInner {
    client: reqwest::Client,
    /// Base URL without trailing slash.
    base_url: String,
    timeout: Duration,
    products: Option<Cache<&'static str, Arc<Vec<Product>>>>,
}

impl HttpApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("truffle-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let products = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                timeout: config.timeout,
                products,
            }),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        self.inner
            .client
            .request(method, url)
            .header("Accept", "application/json")
    }

    /// Send a request and return the success body as text.
    ///
    /// The whole exchange, including reading the body, is bounded by the
    /// configured timeout.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let timeout = self.inner.timeout;

        let exchange = async {
            let response = request.send().await.map_err(|e| map_reqwest(&e, timeout))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| map_reqwest(&e, timeout))?;
            Ok::<_, ApiError>((status, body))
        };

        let (status, body) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| {
                warn!(timeout_secs = timeout.as_secs(), "API request timed out");
                ApiError::Timeout(timeout)
            })??;

        if !status.is_success() {
            return Err(rejected(status, &body));
        }
        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Unexpected API response body"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

fn map_reqwest(error: &reqwest::Error, timeout: Duration) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(timeout)
    } else {
        ApiError::Transport(error.to_string())
    }
}

fn rejected(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ApiMessage>(body)
        .ok()
        .and_then(|m| m.message);
    debug!(
        status = status.as_u16(),
        message = message.as_deref().unwrap_or(""),
        "API returned non-success status"
    );
    ApiError::Rejected {
        status: status.as_u16(),
        message,
    }
}

impl TruffleApi for HttpApiClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &SecretString) -> Result<SessionIdentity, ApiError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let response: LoginResponse = self
            .execute_json(self.request(Method::POST, "/api/login").json(&body))
            .await?;
        Ok(response.user)
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "name": registration.name,
            "email": registration.email.as_str(),
            "password": registration.password.expose_secret(),
            "address": registration.address,
        });
        self.execute(self.request(Method::POST, "/api/register").json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, "/api/logout"))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check_session(&self) -> Result<SessionStatus, ApiError> {
        self.execute_json(self.request(Method::GET, "/api/check_session"))
            .await
    }

    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(cache) = &self.inner.products {
            if let Some(products) = cache.get(PRODUCTS_CACHE_KEY).await {
                debug!("Product list served from cache");
                return Ok(products.as_ref().clone());
            }
        }

        let products: Vec<Product> = self
            .execute_json(self.request(Method::GET, "/api/products"))
            .await?;

        if let Some(cache) = &self.inner.products {
            cache
                .insert(PRODUCTS_CACHE_KEY, Arc::new(products.clone()))
                .await;
        }
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn delivery_slots(&self) -> Result<Vec<DeliverySlot>, ApiError> {
        self.execute_json(self.request(Method::GET, "/api/delivery-slots"))
            .await
    }

    #[instrument(skip(self, order), fields(lines = order.cart_items.len(), date = %order.delivery_date))]
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderRecord, ApiError> {
        let placed: PlacedOrder = self
            .execute_json(self.request(Method::POST, "/api/orders").json(order))
            .await?;
        Ok(placed.order)
    }

    #[instrument(skip(self))]
    async fn order_history(&self) -> Result<Vec<OrderRecord>, ApiError> {
        self.execute_json(self.request(Method::GET, "/api/orders/history"))
            .await
    }

    #[instrument(skip(self, address))]
    async fn update_address(&self, address: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "address": address });
        self.execute(self.request(Method::PUT, "/api/user/address").json(&body))
            .await?;
        Ok(())
    }
}
