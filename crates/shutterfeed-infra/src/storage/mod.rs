//! Object storage for the local backend.

pub mod filesystem;

pub use filesystem::LocalMediaStore;
