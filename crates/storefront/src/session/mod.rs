//! Session gate: login state on every page, plus login, registration and
//! logout.
//!
//! # Flow
//!
//! 1. [`SessionGate::refresh`] renders logged-out controls immediately.
//! 2. It then asks the API whether the session is active.
//! 3. Active: show the account controls; pre-auth pages send the user home.
//! 4. Anything else, including a failed request: logged-out controls and the
//!    cached identity is purged.

mod identity;

pub use identity::IdentityCache;

use std::sync::Arc;

use askama::Template;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use truffle_core::Email;

use crate::api::{Registration, SessionIdentity, TruffleApi};
use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::page::{Navigation, Page};
use crate::views::nav::NavTemplate;
use crate::views::{NavState, Region, Surface, Tone};

const INVALID_EMAIL: &str = "Please enter a valid email address.";

/// Registration form input.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub address: String,
}

/// Keeps the header and the cached identity in line with the server session.
#[derive(Clone)]
pub struct SessionGate<A> {
    api: A,
    identity: IdentityCache,
    surface: Arc<dyn Surface>,
}

impl<A: TruffleApi> SessionGate<A> {
    #[must_use]
    pub fn new(api: A, identity: IdentityCache, surface: Arc<dyn Surface>) -> Self {
        Self {
            api,
            identity,
            surface,
        }
    }

    /// The locally cached identity.
    #[must_use]
    pub const fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    /// Check the server session and render the header accordingly.
    ///
    /// Returns the active identity, if any, and where to go next.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be rendered or the cached
    /// identity cannot be purged.
    #[instrument(skip(self), fields(page = %page))]
    pub async fn refresh(
        &self,
        page: Page,
    ) -> Result<(Option<SessionIdentity>, Navigation), AppError> {
        self.render_nav(&NavState::logged_out())?;

        let active = match self.api.check_session().await {
            Ok(status) => status.active_user(),
            Err(e) => {
                warn!(error = %e, "Session check failed, treating as logged out");
                None
            }
        };

        let Some(user) = active else {
            self.identity.purge()?;
            return Ok((None, Navigation::Stay));
        };

        self.render_nav(&NavState::logged_in(user.name.clone()))?;
        if page.is_pre_auth() {
            info!("Already logged in, leaving pre-auth page");
            return Ok((Some(user), Navigation::Redirect(Page::Home)));
        }
        Ok((Some(user), Navigation::Stay))
    }

    /// Log in with the login form's input.
    ///
    /// # Errors
    ///
    /// Returns an error only if the identity cannot be cached.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Navigation, AppError> {
        self.surface.message(Region::LoginMessage, Tone::Info, "");

        let Ok(email) = Email::parse(email) else {
            self.surface.message(Region::LoginMessage, Tone::Error, INVALID_EMAIL);
            return Ok(Navigation::Stay);
        };

        add_breadcrumb("auth", "Login attempt", &[("email", email.as_str())]);
        match self.api.login(&email, password).await {
            Ok(user) => {
                self.identity.store(&user)?;
                set_sentry_user(&user.email);
                info!(email = %user.email, "Logged in");
                Ok(Navigation::Redirect(Page::Home))
            }
            Err(e) => {
                let text = e.describe("Login failed.", "An error occurred during login.");
                warn!(error = %e, "Login failed");
                self.surface.message(Region::LoginMessage, Tone::Error, &text);
                Ok(Navigation::Stay)
            }
        }
    }

    /// Create an account. Registration does not log the user in.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: RegistrationForm) -> Navigation {
        self.surface.message(Region::RegisterMessage, Tone::Info, "");

        let Ok(email) = Email::parse(&form.email) else {
            self.surface
                .message(Region::RegisterMessage, Tone::Error, INVALID_EMAIL);
            return Navigation::Stay;
        };

        let registration = Registration {
            name: form.name.trim().to_string(),
            email,
            password: form.password,
            address: form.address.trim().to_string(),
        };

        match self.api.register(&registration).await {
            Ok(()) => {
                info!("Registered");
                self.surface.alert("Registration successful! Please login.");
                Navigation::Redirect(Page::Login)
            }
            Err(e) => {
                let text = e.describe("Registration failed.", "An error occurred during registration.");
                warn!(error = %e, "Registration failed");
                self.surface
                    .message(Region::RegisterMessage, Tone::Error, &text);
                Navigation::Stay
            }
        }
    }

    /// End the session and refresh the header.
    ///
    /// On failure the cached identity is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if local state cannot be updated or the header
    /// cannot be rendered.
    #[instrument(skip(self), fields(page = %page))]
    pub async fn logout(&self, page: Page) -> Result<Navigation, AppError> {
        add_breadcrumb("auth", "Logout", &[]);
        match self.api.logout().await {
            Ok(()) => {
                self.identity.purge()?;
                clear_sentry_user();
                info!("Logged out");
                let (_, navigation) = self.refresh(page).await?;
                Ok(navigation)
            }
            Err(e) => {
                let text = e.describe("Logout failed.", "An error occurred during logout.");
                warn!(error = %e, "Logout failed");
                self.surface.message(Region::LogoutMessage, Tone::Error, &text);
                Ok(Navigation::Stay)
            }
        }
    }

    fn render_nav(&self, nav: &NavState) -> Result<(), AppError> {
        let html = NavTemplate { nav }.render()?;
        self.surface.replace(Region::Nav, html);
        Ok(())
    }
}
