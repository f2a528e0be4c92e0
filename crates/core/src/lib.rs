//! Truffle Core - Shared domain types.
//!
//! This crate provides the types shared by the Truffle storefront client:
//! - `storefront` - Cart store, session gate, checkout flow and views
//! - `cli` - Command-line shell driving the storefront against a live API
//! - `integration-tests` - Fake collaborator backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, order statuses
//!   and the delivery-day policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
