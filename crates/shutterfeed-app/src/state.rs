//! Application state wiring a backend to the session orchestrator.
//!
//! The orchestrator is generic over the backend; `AppState` pins it to
//! whichever concrete backend `config.toml` selects.

use std::path::PathBuf;
use std::sync::Arc;

use shutterfeed_core::repository::Backend;
use shutterfeed_core::session::SessionOrchestrator;
use shutterfeed_types::config::ClientConfig;

/// State shared by every CLI command.
pub struct AppState<B: Backend> {
    pub orchestrator: SessionOrchestrator<B>,
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl<B: Backend> AppState<B> {
    /// Wire the orchestrator and resolve the stored session.
    pub async fn init(backend: B, config: ClientConfig, data_dir: PathBuf) -> Self {
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend), &config);
        let view = orchestrator.start().await;
        // A stale stored session publishes an expiry event during start.
        orchestrator.pump_pending().await;
        tracing::debug!(%view, "session resolved");

        Self {
            orchestrator,
            config,
            data_dir,
        }
    }
}

impl<B: Backend> Drop for AppState<B> {
    fn drop(&mut self) {
        self.orchestrator.shutdown();
    }
}
