//! Single-flight module initialization
//!
//! Collapses concurrent initialization requests into one loader run.
//! Leadership is claimed by a compare-and-set on the lifecycle store, so
//! leader and follower roles are derived from observable state rather
//! than held references; followers await the store's watch channel for
//! the in-flight attempt to settle.

use crate::loader::ModuleLoader;
use crate::session::SessionBridge;
use crate::store::{LifecycleStore, ModuleStatus};
use meshgate_common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Guarantees the module loader runs at most once per process lifetime
pub struct Initializer {
    store: Arc<LifecycleStore>,
    loader: Arc<ModuleLoader>,
    bridge: Arc<SessionBridge>,
}

impl Initializer {
    pub fn new(
        store: Arc<LifecycleStore>,
        loader: Arc<ModuleLoader>,
        bridge: Arc<SessionBridge>,
    ) -> Self {
        Self {
            store,
            loader,
            bridge,
        }
    }

    /// Ensure the client module is loaded and ready
    ///
    /// Exactly one caller leads the actual bring-up; everyone else awaits
    /// its outcome. A failed attempt regresses the module to
    /// uninitialized with the error recorded, so a later call may retry.
    pub async fn initialize(&self) -> Result<()> {
        if self.store.module() == ModuleStatus::Initialized {
            return Ok(());
        }

        if !self.store.try_begin_init() {
            return self.await_in_flight().await;
        }

        debug!("Leading module initialization");
        match self.bring_up().await {
            Ok(()) => {
                self.store.set_module(ModuleStatus::Initialized, "");
                info!("Client module initialized");
                Ok(())
            }
            Err(e) => {
                error!("Module initialization failed: {}", e);
                self.store.set_module(ModuleStatus::Uninitialized, e.to_string());
                Err(e)
            }
        }
    }

    async fn bring_up(&self) -> Result<()> {
        self.loader.load_runtime_support().await?;
        self.loader.load_client_module().await?;
        // RDP sub-components are assembled here rather than on first use,
        // so a session request never pays the construction cost
        self.bridge.ensure_rdp_components()?;
        Ok(())
    }

    /// Await the attempt another caller is leading
    ///
    /// A failed attempt surfaces the leader's recorded cause, so
    /// followers report the same diagnostic the leader did.
    async fn await_in_flight(&self) -> Result<()> {
        let mut rx = self.store.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            match state.module {
                ModuleStatus::Initialized => return Ok(()),
                ModuleStatus::Uninitialized => {
                    return Err(Error::InitializationFailed(state.last_error))
                }
                ModuleStatus::Initializing => {}
            }
            if rx.changed().await.is_err() {
                return Err(Error::Internal("lifecycle store closed".to_string()));
            }
        }
    }
}
