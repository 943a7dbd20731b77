use std::sync::Arc;

use crate::generation::orchestrator::AnswerGenerator;
use crate::profile::ProfileStore;
use crate::registry::RegistryClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub generator: Arc<AnswerGenerator>,
    pub registry: RegistryClient,
}
