use std::sync::Arc;

use crate::config::Config;
use crate::jobs::JobBoard;
use crate::session::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Per-user resume and job-search containers, backed by the configured store.
    pub sessions: Arc<SessionRegistry>,
    pub board: Arc<JobBoard>,
    pub config: Config,
}
