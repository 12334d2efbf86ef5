//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::CoordinatorHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: CoordinatorHandle,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Spawn the single match coordinator task; every connection talks
        // to it through this handle.
        let coordinator = CoordinatorHandle::spawn();

        Self {
            config,
            coordinator,
        }
    }
}
