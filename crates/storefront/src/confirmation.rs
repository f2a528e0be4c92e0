//! Order confirmation page and the last-order snapshot behind it.
//!
//! Checkout stores the placed order under
//! [`keys::LAST_ORDER`](crate::storage::keys::LAST_ORDER); the confirmation
//! page takes it exactly once.

use askama::Template;
use tracing::{info, warn};

use crate::api::OrderRecord;
use crate::error::AppError;
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};
use crate::views::{ConfirmationTemplate, Region, Surface, Tone};

/// Persist the order just placed.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be written.
pub fn store_last_order(storage: &dyn KeyValueStore, order: &OrderRecord) -> Result<(), StorageError> {
    write_json(storage, keys::LAST_ORDER, order)
}

/// Read and remove the last-order snapshot.
///
/// A corrupt snapshot reads as `None` and is removed all the same.
pub fn take_last_order(storage: &dyn KeyValueStore) -> Option<OrderRecord> {
    let order = read_json(storage, keys::LAST_ORDER);
    if let Err(e) = storage.remove(keys::LAST_ORDER) {
        warn!(error = %e, "Failed to remove last-order snapshot");
    }
    order
}

/// Render the confirmation page from the last-order snapshot.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn show_confirmation(
    storage: &dyn KeyValueStore,
    surface: &dyn Surface,
) -> Result<Option<OrderRecord>, AppError> {
    let Some(order) = take_last_order(storage) else {
        surface.message(Region::OrderConfirmation, Tone::Info, "No recent order found.");
        return Ok(None);
    };

    let html = ConfirmationTemplate::from(&order).render()?;
    surface.replace(Region::OrderConfirmation, html);
    info!(order_id = %order.id, "Order confirmation shown");
    Ok(Some(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_support::order_record;
    use crate::views::MemorySurface;

    #[test]
    fn test_snapshot_is_read_once() {
        let storage = MemoryStore::new();
        let surface = MemorySurface::new();
        store_last_order(&storage, &order_record(9, 2500)).unwrap();

        let shown = show_confirmation(&storage, &surface).unwrap();
        assert_eq!(shown.unwrap().id.as_i64(), 9);
        assert!(surface.text(Region::OrderConfirmation).contains("Order #9"));

        let shown = show_confirmation(&storage, &surface).unwrap();
        assert_eq!(shown, None);
        assert_eq!(surface.text(Region::OrderConfirmation), "No recent order found.");
    }

    #[test]
    fn test_corrupt_snapshot_is_discarded() {
        let storage = MemoryStore::new();
        storage.set(keys::LAST_ORDER, "{not json").unwrap();

        assert_eq!(take_last_order(&storage), None);
        assert_eq!(storage.get(keys::LAST_ORDER).unwrap(), None);
    }
}
