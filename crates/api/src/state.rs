use std::sync::Arc;

use mediagen_orchestrator::Orchestrator;

/// Shared application state available to all axum handlers via
/// `State<AppState>`. Cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Generation orchestrator (capacity gate, backend clients,
    /// webhook dispatcher).
    pub orchestrator: Arc<Orchestrator>,
}
