//! Application state for the API server

use crate::{Config, SongForge};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the orchestrator instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator instance
    pub forge: Arc<SongForge>,

    /// Configuration (read access for the API layer)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(forge: Arc<SongForge>, config: Arc<Config>) -> Self {
        Self { forge, config }
    }
}
