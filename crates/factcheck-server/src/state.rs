//! Shared application state handed to every route handler.

use std::sync::Arc;

use pipeline::{JobOrchestrator, StatusPublisher};

use crate::auth::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<JobOrchestrator>,
    pub publisher: Arc<StatusPublisher>,
    pub identity: Arc<dyn IdentityProvider>,
}
