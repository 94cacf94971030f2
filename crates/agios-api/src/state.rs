use std::sync::Arc;

use agios_graph::Pipeline;
use agios_persist::{FileStore, PersistenceClient};

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Clients are built once in `main` and shared through `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persistence: Arc<dyn PersistenceClient>,
    pub files: Arc<dyn FileStore>,
    pub pipeline: Pipeline,
    /// Model recorded on freshly created messages
    pub model: String,
}

impl AppState {
    pub fn new(
        config: Config,
        persistence: Arc<dyn PersistenceClient>,
        files: Arc<dyn FileStore>,
        pipeline: Pipeline,
        model: impl Into<String>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            persistence,
            files,
            pipeline,
            model: model.into(),
        }
    }
}
