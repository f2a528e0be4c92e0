//! Catalog, checkout and confirmation commands.

use chrono::Local;

use truffle_core::SlotId;
use truffle_storefront::api::TruffleApi;
use truffle_storefront::page::{Navigation, Page, PageEntry};
use truffle_storefront::state::Storefront;

use super::account::print_order;
use super::{CommandError, follow};

/// List the catalog.
///
/// # Errors
///
/// Returns an error if the page cannot be rendered.
pub async fn catalog<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    follow(storefront.load(Page::Catalog).await?);
    for product in storefront.catalog().load().await? {
        println!(
            "{:>4}  {:<28} {:>8}",
            product.id,
            product.name,
            product.price.display()
        );
    }
    Ok(())
}

/// Choose a delivery and place the order.
///
/// Without a slot, the slots offered for `date` are listed instead.
///
/// # Errors
///
/// Returns an error if the page redirects or local state cannot be updated.
pub async fn checkout<A: TruffleApi>(
    storefront: &Storefront<A>,
    date: &str,
    slot: Option<SlotId>,
    notes: &str,
) -> Result<(), CommandError> {
    let today = Local::now().date_naive();
    let mut checkout = match storefront.open_checkout(today).await? {
        PageEntry::Ready(checkout) => checkout,
        PageEntry::Redirected(page) => return Err(CommandError::Redirected(page)),
    };

    checkout.select_date(date).await?;

    let Some(slot) = slot else {
        for offered in checkout.offered_slots() {
            println!("{:>4}  {} {}", offered.id, offered.day_of_week, offered.time_slot);
        }
        return Ok(());
    };

    if !checkout.select_slot(slot) {
        println!("Slot {slot} is not available on {date}.");
    }
    checkout.set_notes(notes);

    let navigation = checkout.submit().await?;
    if navigation == Navigation::Redirect(Page::OrderConfirmation) {
        return confirmation(storefront).await;
    }
    follow(navigation);
    Ok(())
}

/// Show the order just placed.
///
/// # Errors
///
/// Returns an error if the page cannot be rendered.
pub async fn confirmation<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    match storefront.open_confirmation().await? {
        PageEntry::Ready(Some(order)) => print_order(&order),
        PageEntry::Ready(None) => {}
        PageEntry::Redirected(page) => return Err(CommandError::Redirected(page)),
    }
    Ok(())
}
