//! Connection lifecycle for the single active client handle
//!
//! Owns the handle slot and drives the connect/disconnect state machine:
//!
//! - disconnected --connect--> connecting --success--> connected
//! - disconnected --connect--> connecting --failure--> disconnected
//! - connected --disconnect--> disconnected
//!
//! Connection failures are routine: they are recorded on the store and
//! reported as `false` rather than raised, so callers branch on the
//! boolean and render `last_error`. Grant failures in the temporary
//! flow are the one deliberate exception; see `connect_temporary`.

use crate::config::ClientConfig;
use crate::grant::{TemporaryAccessApi, TemporaryAccessRequest};
use crate::identity::{ephemeral_client_name, IdentityProbe};
use crate::loader::ModuleLoader;
use crate::module::ClientSettings;
use crate::session::HandleSlot;
use crate::singleflight::Initializer;
use crate::store::{ConnectionStatus, LifecycleStore};
use meshgate_common::{Error, Result, WgKeyPair};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives connect/disconnect for exactly one client handle
pub struct ConnectionManager {
    store: Arc<LifecycleStore>,
    loader: Arc<ModuleLoader>,
    initializer: Arc<Initializer>,
    handle: HandleSlot,
    grants: Arc<dyn TemporaryAccessApi>,
    identity: Arc<dyn IdentityProbe>,
    config: ClientConfig,
}

impl ConnectionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<LifecycleStore>,
        loader: Arc<ModuleLoader>,
        initializer: Arc<Initializer>,
        handle: HandleSlot,
        grants: Arc<dyn TemporaryAccessApi>,
        identity: Arc<dyn IdentityProbe>,
        config: ClientConfig,
    ) -> Self {
        Self {
            store,
            loader,
            initializer,
            handle,
            grants,
            identity,
            config,
        }
    }

    /// Connect with the supplied WireGuard private key
    ///
    /// Claims the connecting state up front, so at most one caller
    /// reaches handle construction; an overlapping caller returns the
    /// current connected-ness without side effects.
    pub async fn connect(&self, private_key: &str) -> bool {
        if !self.store.try_begin_connect() {
            debug!("Connect skipped: already {}", self.store.connection());
            return self.store.connection() == ConnectionStatus::Connected;
        }

        self.finish_connect(private_key).await
    }

    /// Drive an already-claimed connect attempt to its outcome
    async fn finish_connect(&self, private_key: &str) -> bool {
        match self.establish(private_key).await {
            Ok(()) => {
                self.store.set_connection(ConnectionStatus::Connected, "");
                info!("Client connected");
                true
            }
            Err(e) => {
                warn!("Connect failed: {}", e);
                self.handle.lock().await.take();
                self.store
                    .set_connection(ConnectionStatus::Disconnected, e.to_string());
                false
            }
        }
    }

    async fn establish(&self, private_key: &str) -> Result<()> {
        self.initializer.initialize().await?;

        let factory = self.loader.factory().ok_or(Error::ClientUnavailable)?;

        let settings = ClientSettings {
            private_key: private_key.to_string(),
            management_url: self.config.management_url.clone(),
            log_level: self.config.log_level.clone(),
        };
        let handle = factory.create(settings).await?;
        handle.start().await?;

        *self.handle.lock().await = Some(handle);
        Ok(())
    }

    /// Ephemeral credential flow
    ///
    /// Generates a fresh key pair, requests a scoped temporary-access
    /// grant for the target peer, then connects with the ephemeral
    /// private key. The connecting state is claimed before the grant is
    /// requested, so overlapping callers can never issue duplicate
    /// grants for throwaway peers; losers report the current
    /// connected-ness without side effects.
    ///
    /// Grant failures propagate as errors after resetting the status:
    /// a refusal from the management API is an authorization outcome the
    /// caller must surface, unlike a routine transport failure.
    pub async fn connect_temporary(
        &self,
        peer_id: &str,
        rules: Option<Vec<String>>,
    ) -> Result<bool> {
        if !self.store.try_begin_connect() {
            debug!(
                "Temporary connect skipped: already {}",
                self.store.connection()
            );
            return Ok(self.store.connection() == ConnectionStatus::Connected);
        }

        let keypair = WgKeyPair::generate();
        let name = ephemeral_client_name(&self.identity.identity());
        let rules = rules.unwrap_or_else(|| self.config.default_access_rules.clone());
        debug!(
            "Requesting temporary access to {} as {} ({} rules)",
            peer_id,
            name,
            rules.len()
        );

        let request = TemporaryAccessRequest {
            name,
            wg_pub_key: keypair.public_key.clone(),
            rules,
        };
        if let Err(e) = self.grants.request_access(peer_id, &request).await {
            self.store
                .set_connection(ConnectionStatus::Disconnected, e.to_string());
            return Err(e);
        }

        Ok(self.finish_connect(&keypair.private_key).await)
    }

    /// Tear down the active handle
    ///
    /// The store flips to disconnected before the handle's stop is
    /// awaited, so concurrent readers observe the disconnect immediately
    /// while teardown completes.
    pub async fn disconnect(&self) -> Result<()> {
        let handle = self.handle.lock().await.take().ok_or(Error::NotReady)?;
        self.store.set_connection(ConnectionStatus::Disconnected, "");

        handle.stop().await?;
        info!("Client disconnected");
        Ok(())
    }
}
