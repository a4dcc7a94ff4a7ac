//! Ties the library to the one preview that may be open at a time.

use crate::config::PreviewConfig;
use crate::library::{KeyValueStore, Library};
use crate::preview::{Clock, PreviewController, PreviewEffect, PreviewEvent, StrategyView};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PreviewSession<S: KeyValueStore> {
    library: Library<S>,
    config: PreviewConfig,
    clock: Arc<dyn Clock>,
    open: Option<PreviewController>,
    /// Last escalation ticket issued by any preview in this session.
    issued_tickets: u64,
}

impl<S: KeyValueStore> PreviewSession<S> {
    pub fn new(storage: S, config: PreviewConfig, clock: Arc<dyn Clock>) -> Self {
        let library = Library::open(storage, &config, clock.clone());
        Self {
            library,
            config,
            clock,
            open: None,
            issued_tickets: 0,
        }
    }

    pub fn library(&self) -> &Library<S> {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library<S> {
        &mut self.library
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Open `url` full-screen, disposing whatever preview was open before.
    pub fn open(&mut self, url: &str) -> StrategyView {
        self.close();
        let seed = self.library.preview_seed(url);
        let controller = PreviewController::from_config(seed, &self.config, self.clock.clone())
            .resume_tickets_after(self.issued_tickets);
        let view = controller.view();
        self.open = Some(controller);
        view
    }

    /// Open the active document, if the pointer resolves to a record.
    pub fn open_active(&mut self) -> Option<StrategyView> {
        let url = self.library.active_record()?.canonical_url.clone();
        Some(self.open(&url))
    }

    pub fn close(&mut self) {
        if let Some(mut controller) = self.open.take() {
            info!(url = %controller.source_url(), mode = %controller.mode(), "Closing preview");
            self.issued_tickets = self.issued_tickets.max(controller.last_ticket());
            controller.dispose();
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn controller(&self) -> Option<&PreviewController> {
        self.open.as_ref()
    }

    pub fn view(&self) -> Option<StrategyView> {
        self.open.as_ref().map(PreviewController::view)
    }

    /// Forward a signal to the open preview. Dropped when nothing is open.
    pub fn apply(&mut self, event: PreviewEvent) -> Vec<PreviewEffect> {
        match self.open.as_mut() {
            Some(controller) => controller.apply(event),
            None => {
                debug!(?event, "No open preview; dropping event");
                Vec::new()
            }
        }
    }

    /// Title of the record behind the open preview.
    pub fn open_title(&self) -> Option<&str> {
        let url = self.open.as_ref()?.source_url();
        self.library
            .records()
            .iter()
            .find(|record| record.canonical_url == url)
            .map(|record| record.title.as_str())
    }
}

impl<S: KeyValueStore> Drop for PreviewSession<S> {
    fn drop(&mut self) {
        self.close();
    }
}
