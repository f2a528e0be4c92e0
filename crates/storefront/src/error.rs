//! Unified error handling with Sentry integration.
//!
//! Expected failures of user actions (the API refusing a login, a slot
//! filling up) are not errors here: controllers render them as messages and
//! stay interactive. [`AppError`] covers what is left: local storage that
//! cannot be written, templates that fail to render, configuration problems.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A view template failed to render.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// Shop API call failed where no fallback exists.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Text safe to show to the user.
    ///
    /// Internal details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Render(_) => {
                "Something went wrong on this device. Please try again.".to_string()
            }
            Self::Api(err) => err.user_message("An error occurred. Please try again."),
            Self::Config(err) => err.to_string(),
        }
    }

    /// Report the error to Sentry (local faults only) and log it.
    pub fn report(&self) {
        if matches!(self, Self::Storage(_) | Self::Render(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::warn!(error = %self, "Storefront error");
        }
    }
}

/// Set the Sentry user context for the logged-in shopper.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_internals() {
        let err = AppError::Storage(StorageError::InvalidKey("../etc".to_string()));
        let message = err.user_message();
        assert!(!message.contains("../etc"));
    }

    #[test]
    fn test_api_user_message_passes_api_text() {
        let err = AppError::Api(ApiError::Rejected {
            status: 400,
            message: Some("Cart cannot be empty".to_string()),
        });
        assert_eq!(err.user_message(), "Cart cannot be empty");
    }

    #[test]
    fn test_display() {
        let err = AppError::Api(ApiError::Transport("connection refused".to_string()));
        assert_eq!(err.to_string(), "API error: Transport error: connection refused");
    }
}
