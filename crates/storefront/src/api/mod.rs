//! Client for the shop's JSON-over-HTTP API.
//!
//! # Architecture
//!
//! - [`TruffleApi`] is the seam between controllers and the remote service.
//!   Controllers are generic over it; production uses [`HttpApiClient`].
//! - The remote service is the authority for sessions, prices and orders.
//!   Nothing here enforces authorization.
//! - Every call is bounded by a timeout. A call that exceeds it is dropped
//!   (aborting the request) and reported as [`ApiError::Timeout`].
//!
//! # Endpoints
//!
//! | Method | Path | Used by |
//! |---|---|---|
//! | POST | `/api/login` | session gate |
//! | POST | `/api/register` | session gate |
//! | POST | `/api/logout` | session gate |
//! | GET | `/api/check_session` | session gate |
//! | GET | `/api/products` | catalog |
//! | GET | `/api/delivery-slots` | checkout |
//! | POST | `/api/orders` | checkout |
//! | GET | `/api/orders/history` | profile |
//! | PUT | `/api/user/address` | profile |

mod http;
pub mod types;

pub use http::HttpApiClient;
pub use types::*;

use std::future::Future;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use truffle_core::Email;

/// Errors that can occur when calling the shop API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// No response within the configured timeout.
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("(no message)"))]
    Rejected {
        status: u16,
        /// `message` field of the JSON error body, if any.
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message reported by the API itself, to be shown verbatim.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// Whether the request timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// User-facing text for this error.
    ///
    /// API-reported failures use the API's message or `fallback`; timeouts get
    /// their own text; transport and parse failures use `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.describe(fallback, fallback)
    }

    /// Like [`user_message`](Self::user_message), with separate fallbacks for
    /// a rejection without message and for a request that never got a usable
    /// answer.
    #[must_use]
    pub fn describe(&self, rejected: &str, unreachable: &str) -> String {
        match self {
            Self::Timeout(_) => TIMEOUT_MESSAGE.to_string(),
            Self::Rejected { .. } => self.api_message().unwrap_or(rejected).to_string(),
            Self::Transport(_) | Self::Parse(_) => unreachable.to_string(),
        }
    }
}

/// Text shown when a request exceeded its timeout.
pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";

/// The remote shop API.
///
/// Every method performs exactly one request.
pub trait TruffleApi: Clone + Send + Sync + 'static {
    /// Log in and return the user's identity.
    fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<SessionIdentity, ApiError>> + Send;

    /// Create an account. Does not log in.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// End the current session.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Ask whether the current session is logged in.
    fn check_session(&self) -> impl Future<Output = Result<SessionStatus, ApiError>> + Send;

    /// List the catalog.
    fn products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// List every delivery slot for every day.
    fn delivery_slots(&self) -> impl Future<Output = Result<Vec<DeliverySlot>, ApiError>> + Send;

    /// Place an order and return the created record.
    fn place_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderRecord, ApiError>> + Send;

    /// Orders of the logged-in user, newest first.
    fn order_history(&self) -> impl Future<Output = Result<Vec<OrderRecord>, ApiError>> + Send;

    /// Replace the logged-in user's delivery address.
    fn update_address(&self, address: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}
