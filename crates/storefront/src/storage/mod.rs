//! Persisted client-side key-value storage.
//!
//! The storefront keeps three JSON documents between runs: the cart, the
//! cached session identity and the last placed order. Each lives under a
//! fixed key in a [`KeyValueStore`]. Production uses [`FileStore`]; tests use
//! [`MemoryStore`].
//!
//! Values are plain JSON with no schema versioning. A value that fails to
//! parse is treated as absent, never raised as an error.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Key for the cart line items.
    pub const CART: &str = "truffleCart";

    /// Key for the cached session identity.
    pub const USER: &str = "truffleUser";

    /// Key for the snapshot of the last placed order.
    pub const LAST_ORDER: &str = "lastOrderDetails";
}

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that cannot be stored.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Value could not be serialized.
    #[error("Serialization error on key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string-keyed store of string values.
///
/// Implementations must make each `set` atomic: a concurrent reader sees
/// either the old or the new value, never a partial one.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and parse a JSON value.
///
/// Missing, unreadable and corrupt values all come back as `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring corrupt stored value");
            None
        }
    }
}

/// Serialize and store a JSON value.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or written.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(read_json::<Vec<u32>>(&store, keys::CART), None);
    }

    #[test]
    fn test_read_json_corrupt_is_none() {
        let store = MemoryStore::new();
        store.set(keys::CART, "{not json").unwrap();
        assert_eq!(read_json::<Vec<u32>>(&store, keys::CART), None);
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        write_json(&store, keys::LAST_ORDER, &vec![1_u32, 2, 3]).unwrap();
        assert_eq!(
            read_json::<Vec<u32>>(&store, keys::LAST_ORDER),
            Some(vec![1, 2, 3])
        );
    }
}
