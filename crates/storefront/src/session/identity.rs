//! Locally cached session identity.
//!
//! A possibly stale mirror of the server-side session, kept so pages can show
//! the user's name and address without a round-trip. The remote session check
//! stays authoritative: the gate purges this cache whenever the server says
//! the session is gone.

use std::sync::Arc;

use crate::api::SessionIdentity;
use crate::page::{Page, PageEntry};
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};
use crate::views::Surface;

/// Handle to the cached identity under [`keys::USER`].
#[derive(Clone)]
pub struct IdentityCache {
    storage: Arc<dyn KeyValueStore>,
}

impl IdentityCache {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// The cached identity. Missing or corrupt state reads as `None`.
    #[must_use]
    pub fn get(&self) -> Option<SessionIdentity> {
        read_json(self.storage.as_ref(), keys::USER)
    }

    /// Replace the cached identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be persisted.
    pub fn store(&self, identity: &SessionIdentity) -> Result<(), StorageError> {
        write_json(self.storage.as_ref(), keys::USER, identity)
    }

    /// Rewrite the cached address, if an identity is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be persisted.
    pub fn update_address(&self, address: &str) -> Result<(), StorageError> {
        match self.get() {
            Some(mut identity) => {
                identity.address = Some(address.to_string());
                self.store(&identity)
            }
            None => Ok(()),
        }
    }

    /// Forget the cached identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value cannot be removed.
    pub fn purge(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::USER)
    }

    /// Gate for pages that need a logged-in user.
    ///
    /// Reads the cache synchronously. With no identity the visitor is told to
    /// log in and sent to the login page. This only spares the user a page
    /// that cannot work; the API rejects unauthenticated calls on its own.
    pub fn require_session(&self, page: Page, surface: &dyn Surface) -> PageEntry<SessionIdentity> {
        if let Some(identity) = self.get() {
            return PageEntry::Ready(identity);
        }

        tracing::info!(page = %page, "No cached session, redirecting to login");
        if let Some(prompt) = page.login_prompt() {
            surface.alert(prompt);
        }
        PageEntry::Redirected(Page::Login)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::views::MemorySurface;

    fn ada() -> SessionIdentity {
        SessionIdentity {
            id: None,
            name: "Ada".to_string(),
            email: "ada@truffle.shop".to_string(),
            address: None,
        }
    }

    #[test]
    fn test_store_get_purge() {
        let cache = IdentityCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.get(), None);

        cache.store(&ada()).unwrap();
        assert_eq!(cache.get().unwrap().name, "Ada");

        cache.update_address("Via Roma 1").unwrap();
        assert_eq!(cache.get().unwrap().address(), Some("Via Roma 1"));

        cache.purge().unwrap();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_update_address_without_identity_is_noop() {
        let storage = Arc::new(MemoryStore::new());
        let cache = IdentityCache::new(storage.clone());
        cache.update_address("Via Roma 1").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_require_session_redirects_with_prompt() {
        let cache = IdentityCache::new(Arc::new(MemoryStore::new()));
        let surface = MemorySurface::new();

        let entry = cache.require_session(Page::Checkout, &surface);
        assert_eq!(entry.redirect(), Some(Page::Login));
        assert_eq!(
            surface.alerts(),
            vec!["Please login to schedule your delivery.".to_string()]
        );

        cache.store(&ada()).unwrap();
        let entry = cache.require_session(Page::Checkout, &surface);
        assert_eq!(entry.ready().unwrap().name, "Ada");
    }
}
