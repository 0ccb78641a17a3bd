//! Owned listener handle.

use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

type Filter<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A registered listener on an [`EventBus`](super::EventBus).
///
/// The subscription is released when dropped; `unsubscribe` makes the
/// release explicit at call sites that tear down.
pub struct Subscription<E: Clone> {
    topic: &'static str,
    receiver: broadcast::Receiver<E>,
    filter: Option<Filter<E>>,
}

impl<E: Clone> Subscription<E> {
    pub fn new(topic: &'static str, receiver: broadcast::Receiver<E>) -> Self {
        Self {
            topic,
            receiver,
            filter: None,
        }
    }

    pub fn filtered<F>(topic: &'static str, receiver: broadcast::Receiver<E>, filter: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            topic,
            receiver,
            filter: Some(Arc::new(filter)),
        }
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }

    fn accepts(&self, event: &E) -> bool {
        self.filter.as_ref().is_none_or(|f| f(event))
    }

    /// Wait for the next matching event.
    ///
    /// Returns `None` once every sender is gone. A lagged receiver skips the
    /// overwritten events and keeps going.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = self.topic, skipped, "subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = self.topic, skipped, "subscription lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Release the listener.
    pub fn unsubscribe(self) {
        tracing::debug!(topic = self.topic, "unsubscribed");
    }
}

impl<E: Clone> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
