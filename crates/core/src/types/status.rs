//! Order status as reported by the order history endpoint.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a placed order.
///
/// The API reports statuses as capitalised words (`"Pending"`). Statuses this
/// client does not know about deserialize to [`OrderStatus::Other`] rather
/// than failing the whole history response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
    #[serde(other)]
    Other,
}

impl OrderStatus {
    /// Whether the order is still waiting to be processed.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other => "Unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
