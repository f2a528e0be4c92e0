//! Truffle shop storefront client library.
//!
//! The client half of the shop: a persisted cart, the session gate that keeps
//! login state in line with the server, and the catalog, checkout and profile
//! pages. Pages are driven through [`state::Storefront`] and render typed
//! fragments onto a [`views::Surface`]; the server is reached through
//! [`api::TruffleApi`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod page;
pub mod profile;
pub mod session;
pub mod state;
pub mod storage;
pub mod views;

#[cfg(test)]
mod test_support;
