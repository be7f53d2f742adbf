use std::sync::Arc;

use crate::config::Config;
use crate::notify::Mailer;
use crate::store::JobBoardStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend. PostgreSQL in production, in-memory for tests.
    pub store: Arc<dyn JobBoardStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}
