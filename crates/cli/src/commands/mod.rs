//! Command implementations.
//!
//! Each command loads the page it stands for, performs the action and prints
//! a plain-text view of the result.

#![allow(clippy::print_stdout)]

pub mod account;
pub mod cart;
pub mod shop;

use thiserror::Error;

use truffle_core::ProductId;
use truffle_storefront::cart::Cart;
use truffle_storefront::error::AppError;
use truffle_storefront::page::{Navigation, Page};
use truffle_storefront::storage::StorageError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    App(#[from] AppError),

    /// The product is not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The page refused to open.
    #[error("Redirected to {0}")]
    Redirected(Page),
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        Self::App(AppError::from(err))
    }
}

/// Report where the storefront wants to go next.
fn follow(navigation: Navigation) {
    if let Navigation::Redirect(page) = navigation {
        println!("-> {page}");
    }
}

/// Print the cart lines and total.
fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:>4}  {:<28} {:>3} x {:>8}  {:>9}",
            line.id,
            line.name,
            line.quantity,
            line.price.display(),
            line.line_total().display()
        );
    }
    println!("Total: {} ({} items)", cart.total().display(), cart.item_count());
}
