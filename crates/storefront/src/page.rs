//! Pages of the storefront and navigation between them.

use core::fmt;

/// A storefront page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Catalog,
    Cart,
    Login,
    Register,
    Checkout,
    Profile,
    OrderConfirmation,
}

impl Page {
    /// Path of the page relative to the site root.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "home.html",
            Self::Catalog => "catalog.html",
            Self::Cart => "cart.html",
            Self::Login => "login.html",
            Self::Register => "register.html",
            Self::Checkout => "delivery-book.html",
            Self::Profile => "profile.html",
            Self::OrderConfirmation => "order-confirmation.html",
        }
    }

    /// Pages whose only purpose is to get a visitor logged in.
    ///
    /// A logged-in user landing on one is sent home.
    #[must_use]
    pub const fn is_pre_auth(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// Notice shown when a logged-out visitor opens a page that needs a
    /// session, or `None` if the page is open to everyone.
    #[must_use]
    pub const fn login_prompt(self) -> Option<&'static str> {
        match self {
            Self::Checkout => Some("Please login to schedule your delivery."),
            Self::Profile => Some("Please login to view your profile and order history."),
            _ => None,
        }
    }

    /// Whether the page needs a cached identity before it initialises.
    #[must_use]
    pub const fn requires_session(self) -> bool {
        self.login_prompt().is_some()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What the shell should do after a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Navigation {
    /// Remain on the current page.
    Stay,
    /// Navigate to another page.
    Redirect(Page),
}

impl Navigation {
    /// The redirect target, if any.
    #[must_use]
    pub const fn target(self) -> Option<Page> {
        match self {
            Self::Stay => None,
            Self::Redirect(page) => Some(page),
        }
    }
}

/// Result of opening a page that may refuse to initialise.
#[derive(Debug)]
#[must_use]
pub enum PageEntry<T> {
    /// The page initialised; `T` drives its interactions.
    Ready(T),
    /// The page refused to initialise and sent the visitor elsewhere.
    Redirected(Page),
}

impl<T> PageEntry<T> {
    /// The page controller, if the page initialised.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Redirected(_) => None,
        }
    }

    /// The redirect target, if the page refused to initialise.
    pub const fn redirect(&self) -> Option<Page> {
        match self {
            Self::Ready(_) => None,
            Self::Redirected(page) => Some(*page),
        }
    }
}
