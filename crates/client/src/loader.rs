//! Module loader
//!
//! Brings the binary network-client module from not-present to callable
//! in the host process. Loading is irreversible: there is no unload path.

use crate::config::ModuleConfig;
use crate::module::{ClientFactory, ModuleHost};
use meshgate_common::{Error, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Loads the client module and resolves its constructor capability once
pub struct ModuleLoader {
    host: Arc<dyn ModuleHost>,
    config: ModuleConfig,
    factory: OnceCell<Arc<dyn ClientFactory>>,
}

impl ModuleLoader {
    /// Create a new loader over the given host integration
    pub fn new(host: Arc<dyn ModuleHost>, config: ModuleConfig) -> Self {
        Self {
            host,
            config,
            factory: OnceCell::new(),
        }
    }

    /// The resolved client constructor, if the module has been loaded
    pub fn factory(&self) -> Option<Arc<dyn ClientFactory>> {
        self.factory.get().cloned()
    }

    /// Ensure the bytecode-execution support layer is attached
    ///
    /// Presence is probed on the host, not counted: a second call while
    /// the layer is already attached is a no-op.
    pub async fn load_runtime_support(&self) -> Result<()> {
        if self.host.runtime_ready() {
            return Ok(());
        }
        self.host.attach_runtime().await?;
        debug!("Runtime support layer attached");
        Ok(())
    }

    /// Instantiate the client module and wait for its entry point
    ///
    /// Returns immediately when the constructor is already resolved or
    /// already published by the host. Otherwise starts the module's run
    /// loop and polls for the constructor at the configured interval
    /// until it appears or the configured deadline elapses.
    pub async fn load_client_module(&self) -> Result<()> {
        if self.factory.get().is_some() {
            return Ok(());
        }
        if let Some(factory) = self.host.client_factory() {
            let _ = self.factory.set(factory);
            return Ok(());
        }

        self.host.instantiate().await?;
        debug!("Client module instantiated, waiting for entry point");

        let poll = Duration::from_millis(self.config.ready_poll_interval_ms);
        let deadline = Duration::from_millis(self.config.ready_timeout_ms);

        let factory = tokio::time::timeout(deadline, async {
            loop {
                if let Some(factory) = self.host.client_factory() {
                    return factory;
                }
                tokio::time::sleep(poll).await;
            }
        })
        .await
        .map_err(|_| Error::ModuleReadyTimeout)?;

        let _ = self.factory.set(factory);
        info!("Client module loaded");
        Ok(())
    }
}
