//! Session/view orchestration.
//!
//! `transition` holds the pure view decision; `orchestrator` owns the
//! session and profile state, listens for backend events, and re-evaluates
//! the decision whenever either changes.

pub mod orchestrator;
pub mod transition;

pub use orchestrator::SessionOrchestrator;
pub use transition::resolve_view;
