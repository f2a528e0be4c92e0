//! Core types for the Truffle storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod delivery;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use delivery::{DeliveryDays, DeliveryDaysError, weekday_name};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::OrderStatus;
