//! Application state wiring

use std::sync::Arc;

use tracing::info;

use homewire_hap::{AccessoryDirectory, MemoryDirectory};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::hub::ClientHub;
use crate::registry::AccessoryRegistry;

/// Shared application state
pub struct AppState {
    /// Client broadcast hub
    pub hub: ClientHub,
    /// Accessory registry
    pub registry: Arc<AccessoryRegistry>,
    /// Protocol dispatcher
    pub dispatcher: Dispatcher,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Build the component graph and re-attach hooks to any accessories the
    /// framework restored from a prior session.
    pub fn new(config: Config) -> Arc<Self> {
        let directory = Arc::new(MemoryDirectory::new());
        let hub = ClientHub::new();
        let registry = Arc::new(AccessoryRegistry::new(
            directory.clone(),
            hub.clone(),
            config.sync.read_prompt_window(),
        ));
        let dispatcher = Dispatcher::new(registry.clone());

        let cached = directory.cached();
        if !cached.is_empty() {
            info!(count = cached.len(), "Restoring cached accessories");
        }
        for port in cached {
            registry.restore(port);
        }
        info!(accessories = registry.len(), "Launch complete");

        Arc::new(Self {
            hub,
            registry,
            dispatcher,
            config,
        })
    }
}
