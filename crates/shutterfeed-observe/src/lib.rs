//! Observability setup shared by Shutterfeed binaries.

pub mod tracing_setup;
