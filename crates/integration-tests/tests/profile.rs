//! Profile page over HTTP: details, address and order history.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::NaiveDate;

use truffle_integration_tests::{ADA_ADDRESS, ADA_EMAIL, ADA_PASSWORD, TestShop, seeded};
use truffle_storefront::api::HttpApiClient;
use truffle_storefront::page::{Page, PageEntry};
use truffle_storefront::profile::ProfileController;
use truffle_storefront::views::Region;

async fn open_profile(shop: &TestShop) -> ProfileController<HttpApiClient> {
    match shop.storefront.open_profile().await.unwrap() {
        PageEntry::Ready(profile) => profile,
        PageEntry::Redirected(page) => panic!("profile redirected to {page}"),
    }
}

#[tokio::test]
async fn test_logged_out_profile_redirects_without_history_call() {
    let shop = TestShop::with_ada().await;

    let entry = shop.storefront.open_profile().await.unwrap();

    assert!(matches!(entry, PageEntry::Redirected(Page::Login)));
    assert_eq!(shop.backend.hits("/api/check_session"), 1);
    assert_eq!(shop.backend.hits("/api/orders/history"), 0);
}

#[tokio::test]
async fn test_stale_cache_is_purged_before_profile_loads() {
    let shop = TestShop::with_ada().await;
    shop.login(ADA_EMAIL, ADA_PASSWORD).await;
    shop.backend.expire_sessions();

    let entry = shop.storefront.open_profile().await.unwrap();

    assert!(matches!(entry, PageEntry::Redirected(Page::Login)));
    assert!(shop.storefront.identity().get().is_none());
    assert_eq!(shop.backend.hits("/api/orders/history"), 0);
}

#[tokio::test]
async fn test_profile_shows_details_and_empty_history() {
    let shop = TestShop::with_ada().await;
    shop.login(ADA_EMAIL, ADA_PASSWORD).await;

    let profile = open_profile(&shop).await;

    assert_eq!(profile.user().email, ADA_EMAIL);
    assert!(profile.orders().is_empty());
    let details = shop.surface.text(Region::ProfileDetails);
    assert!(details.contains(ADA_EMAIL));
    assert!(details.contains(ADA_ADDRESS));
    assert_eq!(
        shop.surface.text(Region::OrderHistory),
        "You have no past orders."
    );
}

#[tokio::test]
async fn test_address_update_reaches_server_and_cache() {
    let shop = TestShop::with_ada().await;
    shop.login(ADA_EMAIL, ADA_PASSWORD).await;
    let mut profile = open_profile(&shop).await;

    assert!(profile.update_address("Piazza Duomo 2, Alba").await.unwrap());

    assert_eq!(
        shop.backend.address_of(ADA_EMAIL).as_deref(),
        Some("Piazza Duomo 2, Alba")
    );
    assert_eq!(
        shop.storefront.identity().get().unwrap().address(),
        Some("Piazza Duomo 2, Alba")
    );
    assert_eq!(
        shop.surface.text(Region::AddressMessage),
        "Address updated successfully!"
    );

    // A fresh session check agrees with the cache.
    let (user, _) = shop
        .storefront
        .session_gate()
        .refresh(Page::Profile)
        .await
        .unwrap();
    assert_eq!(user.unwrap().address(), Some("Piazza Duomo 2, Alba"));
}

#[tokio::test]
async fn test_address_update_after_session_loss() {
    let shop = TestShop::with_ada().await;
    shop.login(ADA_EMAIL, ADA_PASSWORD).await;
    let mut profile = open_profile(&shop).await;
    shop.backend.expire_sessions();

    assert!(!profile.update_address("Via Po 3, Torino").await.unwrap());

    assert_eq!(
        shop.surface.text(Region::AddressMessage),
        "Authentication required"
    );
    assert_eq!(shop.backend.address_of(ADA_EMAIL).as_deref(), Some(ADA_ADDRESS));
}

#[tokio::test]
async fn test_history_lists_placed_orders() {
    let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let shop = TestShop::new(seeded().today(monday).start().await);
    shop.login(ADA_EMAIL, ADA_PASSWORD).await;

    for date in ["2026-10-24", "2026-10-25"] {
        shop.fill_cart(&[(3, 2)]).await;
        let PageEntry::Ready(mut checkout) = shop.storefront.open_checkout(monday).await.unwrap()
        else {
            panic!("checkout redirected");
        };
        checkout.select_date(date).await.unwrap();
        let slot = checkout.offered_slots().first().unwrap().id;
        assert!(checkout.select_slot(slot));
        checkout.submit().await.unwrap();
    }

    let profile = open_profile(&shop).await;

    let ids: Vec<i64> = profile.orders().iter().map(|o| o.id.as_i64()).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(profile.orders()[0].delivery_slot_description, "Sunday 10:00-14:00");
    assert_eq!(profile.orders()[1].items[0].product_name, "Sale al Tartufo");
    let history = shop.surface.text(Region::OrderHistory);
    assert!(history.contains("Order #2"));
    assert!(history.contains("Placed on: 19 October 2026"));
}
