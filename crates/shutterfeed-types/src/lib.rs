//! Shared domain types for Shutterfeed.
//!
//! This crate contains the core domain types used across the Shutterfeed client:
//! Session, Profile, Post, the view model, events, configuration, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod config;
pub mod error;
pub mod event;
pub mod post;
pub mod profile;
pub mod user;
pub mod view;
