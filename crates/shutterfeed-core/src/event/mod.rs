//! Event distribution for backend listeners.
//!
//! Provides a generic `EventBus` over `tokio::sync::broadcast` and the owned
//! `Subscription` handle that listeners hold for as long as they care about
//! events. Dropping (or calling `unsubscribe` on) a subscription releases it.

pub mod bus;
pub mod subscription;

pub use bus::EventBus;
pub use subscription::Subscription;
