//! Fingerprint poller.

use std::time::Duration;

use shutterfeed_core::event::EventBus;
use shutterfeed_types::event::{ChangeKind, Table, TableChange};
use tokio::task::JoinHandle;

use super::Fingerprint;

/// Poll `source` every `interval` and publish a posts `TableChange` whenever
/// its fingerprint differs from the previous poll.
///
/// The first successful poll only records a baseline. Poll errors are logged
/// and the previous baseline is kept.
pub fn spawn_poller<F: Fingerprint>(
    source: F,
    bus: EventBus<TableChange>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last: Option<String> = None;

        loop {
            ticker.tick().await;
            match source.fingerprint().await {
                Ok(current) => {
                    if last.as_ref().is_some_and(|prev| *prev != current) {
                        tracing::debug!(fingerprint = %current, "posts changed remotely");
                        bus.publish(TableChange {
                            table: Table::Posts,
                            kind: ChangeKind::Update,
                            row_id: None,
                        });
                    }
                    last = Some(current);
                }
                Err(e) => tracing::warn!(error = %e, "change poll failed"),
            }
        }
    })
}
