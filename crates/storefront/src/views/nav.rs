//! Header navigation view.

use askama::Template;

/// Visibility of the session-dependent header controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub login_visible: bool,
    pub register_visible: bool,
    pub logout_visible: bool,
    pub account_visible: bool,
    /// Shown next to the account link when logged in.
    pub user_name: Option<String>,
}

impl NavState {
    /// Anonymous visitor: login and register shown, everything else hidden.
    #[must_use]
    pub const fn logged_out() -> Self {
        Self {
            login_visible: true,
            register_visible: true,
            logout_visible: false,
            account_visible: false,
            user_name: None,
        }
    }

    /// Authenticated user: logout, account and name shown.
    #[must_use]
    pub fn logged_in(name: impl Into<String>) -> Self {
        Self {
            login_visible: false,
            register_visible: false,
            logout_visible: true,
            account_visible: true,
            user_name: Some(name.into()),
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.logout_visible
    }
}

/// Header navigation fragment.
#[derive(Template)]
#[template(path = "partials/nav.html")]
pub struct NavTemplate<'a> {
    pub nav: &'a NavState,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_out_hides_account_controls() {
        let nav = NavState::logged_out();
        let html = NavTemplate { nav: &nav }.render().unwrap();
        assert!(html.contains(r#"id="nav-login" href="login.html">"#));
        assert!(html.contains(r#"data-action="logout" hidden>"#));
        assert!(!html.contains("nav-user-name"));
    }

    #[test]
    fn test_logged_in_shows_name() {
        let nav = NavState::logged_in("Ada");
        assert!(nav.is_logged_in());
        let html = NavTemplate { nav: &nav }.render().unwrap();
        assert!(html.contains(r#"<span id="nav-user-name">Ada</span>"#));
        assert!(html.contains(r#"href="login.html" hidden>"#));
    }
}
