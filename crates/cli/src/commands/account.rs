//! Session and account commands.

use secrecy::SecretString;

use truffle_storefront::api::{OrderRecord, TruffleApi};
use truffle_storefront::page::{Page, PageEntry};
use truffle_storefront::profile::ProfileController;
use truffle_storefront::session::RegistrationForm;
use truffle_storefront::state::Storefront;

use super::{CommandError, follow};

/// Log in from the login page.
///
/// # Errors
///
/// Returns an error if local state cannot be updated.
pub async fn login<A: TruffleApi>(
    storefront: &Storefront<A>,
    email: &str,
    password: String,
) -> Result<(), CommandError> {
    follow(storefront.load(Page::Login).await?);
    let password = SecretString::from(password);
    follow(storefront.session_gate().login(email, &password).await?);
    if let Some(user) = storefront.identity().get() {
        println!("Logged in as {} <{}>", user.name, user.email);
    }
    Ok(())
}

/// Create an account from the registration page.
///
/// # Errors
///
/// Returns an error if the page cannot be rendered.
pub async fn register<A: TruffleApi>(
    storefront: &Storefront<A>,
    name: String,
    email: String,
    password: String,
    address: String,
) -> Result<(), CommandError> {
    follow(storefront.load(Page::Register).await?);
    let form = RegistrationForm {
        name,
        email,
        password: SecretString::from(password),
        address,
    };
    follow(storefront.session_gate().register(form).await);
    Ok(())
}

/// Log out.
///
/// # Errors
///
/// Returns an error if local state cannot be updated.
pub async fn logout<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    follow(storefront.load(Page::Home).await?);
    follow(storefront.session_gate().logout(Page::Home).await?);
    if storefront.identity().get().is_none() {
        println!("Logged out.");
    }
    Ok(())
}

/// Show the session state.
///
/// # Errors
///
/// Returns an error if local state cannot be updated.
pub async fn session<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    let (user, navigation) = storefront.session_gate().refresh(Page::Home).await?;
    follow(navigation);
    match user {
        Some(user) => println!("Logged in as {} <{}>", user.name, user.email),
        None => println!("Not logged in."),
    }
    Ok(())
}

/// Show account details and order history.
///
/// # Errors
///
/// Returns an error if the page redirects or cannot be rendered.
pub async fn profile<A: TruffleApi>(storefront: &Storefront<A>) -> Result<(), CommandError> {
    let profile = open_profile(storefront).await?;
    print_details(&profile);
    println!();
    for order in profile.orders() {
        print_order(order);
    }
    Ok(())
}

/// Change the delivery address.
///
/// # Errors
///
/// Returns an error if the page redirects or local state cannot be updated.
pub async fn address<A: TruffleApi>(
    storefront: &Storefront<A>,
    address: &str,
) -> Result<(), CommandError> {
    let mut profile = open_profile(storefront).await?;
    if profile.update_address(address).await? {
        print_details(&profile);
    }
    Ok(())
}

async fn open_profile<A: TruffleApi>(
    storefront: &Storefront<A>,
) -> Result<ProfileController<A>, CommandError> {
    match storefront.open_profile().await? {
        PageEntry::Ready(profile) => Ok(profile),
        PageEntry::Redirected(page) => Err(CommandError::Redirected(page)),
    }
}

fn print_details<A: TruffleApi>(profile: &ProfileController<A>) {
    let user = profile.user();
    println!("Name:    {}", user.name);
    println!("Email:   {}", user.email);
    println!("Address: {}", user.address().unwrap_or("Not set"));
}

/// Print one order as a short block.
pub fn print_order(order: &OrderRecord) {
    println!(
        "Order #{} - {} {} - {} [{}]",
        order.id,
        order.delivery_date,
        order.delivery_slot_description,
        order.total_amount.display(),
        order.status
    );
    for item in &order.items {
        println!(
            "    {} x {} ({} each)",
            item.product_name,
            item.quantity,
            item.price.display()
        );
    }
    if let Some(notes) = order.delivery_notes.as_deref().filter(|n| !n.is_empty()) {
        println!("    Notes: {notes}");
    }
}
