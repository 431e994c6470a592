use std::sync::Arc;

use crate::observability::metrics::Metrics;
use crate::store::{FleetStore, InMemoryStore};

pub struct AppState {
    pub store: Arc<dyn FleetStore>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self {
            store,
            metrics: Metrics::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}
