use std::sync::Arc;

use completion_client::CompletionBackend;
use leadflow_core::generation::{GenerationSettings, Generator};
use leadflow_core::leads::LeadService;
use leadflow_core::store::Store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub generator: Generator,
    pub leads: LeadService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        backend: Arc<dyn CompletionBackend>,
        settings: GenerationSettings,
    ) -> Self {
        let generator = Generator::new(store.clone(), backend, settings);
        Self {
            store,
            leads: LeadService::new(generator.clone()),
            generator,
        }
    }

    /// Same state without the background auto-trigger on creates and moves.
    pub fn without_auto_trigger(mut self) -> Self {
        self.leads = self.leads.without_auto_trigger();
        self
    }
}
