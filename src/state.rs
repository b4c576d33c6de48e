//! Application state management

use std::sync::Arc;

use crate::annotations::AnnotationService;
use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    annotations: AnnotationService,
}

impl AppState {
    /// Create a new application state around an opened annotation service
    pub fn new(config: Config, annotations: AnnotationService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                annotations,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the annotation service
    pub fn annotations(&self) -> &AnnotationService {
        &self.inner.annotations
    }
}
