//! Realtime change notification port.

use shutterfeed_types::event::{Table, TableChange};

use crate::event::Subscription;

/// Source of table-change notifications.
///
/// Delivery is best-effort and unordered relative to the caller's own
/// writes; consumers must treat a notification as "refetch", not as data.
pub trait ChangeFeed: Send + Sync {
    /// Register a listener for changes to one table.
    fn subscribe(&self, table: Table) -> Subscription<TableChange>;
}
