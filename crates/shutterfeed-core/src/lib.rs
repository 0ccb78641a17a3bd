//! Business logic, port traits, and the session orchestrator for Shutterfeed.
//!
//! This crate defines the ports (backend traits) that the infrastructure
//! layer implements. It depends only on `shutterfeed-types`, never on
//! `shutterfeed-infra` or any database/HTTP crate.

pub mod event;
pub mod repository;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
