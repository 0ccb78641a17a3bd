//! Table-change notification for both backends.
//!
//! Repositories publish their own writes onto a shared [`EventBus`]. A
//! background poller catches writes made elsewhere (another process, another
//! device) by watching a cheap fingerprint of the posts table.

pub mod polling;

use std::future::Future;

use shutterfeed_core::event::{EventBus, Subscription};
use shutterfeed_core::repository::ChangeFeed;
use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::event::{Table, TableChange};
use tokio::task::JoinHandle;

pub use polling::spawn_poller;

/// A summary of table contents that changes whenever a row is added or
/// removed.
pub trait Fingerprint: Send + Sync + 'static {
    fn fingerprint(&self) -> impl Future<Output = Result<String, RepositoryError>> + Send;
}

/// `ChangeFeed` over a shared bus, optionally fed by a poller.
///
/// The poller task is aborted when the hub is dropped.
pub struct ChangeHub {
    bus: EventBus<TableChange>,
    poller: Option<JoinHandle<()>>,
}

impl ChangeHub {
    pub fn new(bus: EventBus<TableChange>) -> Self {
        Self { bus, poller: None }
    }

    pub fn with_poller(bus: EventBus<TableChange>, poller: JoinHandle<()>) -> Self {
        Self {
            bus,
            poller: Some(poller),
        }
    }

    pub fn bus(&self) -> &EventBus<TableChange> {
        &self.bus
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }
}

impl ChangeFeed for ChangeHub {
    fn subscribe(&self, table: Table) -> Subscription<TableChange> {
        self.bus
            .subscribe_filtered("table-change", move |change: &TableChange| change.table == table)
    }
}

impl Drop for ChangeHub {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}
