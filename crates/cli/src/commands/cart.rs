//! `truffle cart` commands.

use truffle_core::ProductId;
use truffle_storefront::api::TruffleApi;
use truffle_storefront::page::Page;
use truffle_storefront::state::Storefront;
use truffle_storefront::views::CartRenderer;

use super::{CommandError, follow, print_cart};

/// Show the cart page.
///
/// # Errors
///
/// Returns an error if the page cannot be rendered.
pub async fn show<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    follow(storefront.load(Page::Cart).await?);
    print_cart(&storefront.cart().get());
    Ok(())
}

/// Add one unit of a catalog product.
///
/// # Errors
///
/// Returns an error if the product is unknown or the cart cannot be saved.
pub async fn add<A: TruffleApi>(
    storefront: &Storefront<A>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    follow(storefront.load(Page::Catalog).await?);
    let catalog = storefront.catalog();
    let products = catalog.load().await?;
    let product = products
        .iter()
        .find(|p| p.id == product_id)
        .ok_or(CommandError::UnknownProduct(product_id))?;

    let cart = catalog.add_to_cart(product)?;
    print_cart(&cart);
    Ok(())
}

/// Set a line's quantity from raw input.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn set_quantity<A: TruffleApi>(
    storefront: &Storefront<A>,
    product_id: ProductId,
    raw: &str,
) -> Result<(), CommandError> {
    follow(storefront.load(Page::Cart).await?);
    let cart = CartRenderer::on_quantity_change(storefront.cart(), product_id, raw)?;
    print_cart(&cart);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn remove<A: TruffleApi>(
    storefront: &Storefront<A>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    follow(storefront.load(Page::Cart).await?);
    let cart = CartRenderer::on_remove(storefront.cart(), product_id)?;
    print_cart(&cart);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn clear<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    follow(storefront.load(Page::Cart).await?);
    let cart = storefront.cart().clear()?;
    print_cart(&cart);
    Ok(())
}
