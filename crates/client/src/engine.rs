//! Engine façade wiring the lifecycle components together
//!
//! One engine per application lifetime: it owns the store, loader,
//! initializer, connection manager, and session bridge, and exposes the
//! surface the dashboard consumes.

use crate::config::ClientConfig;
use crate::grant::TemporaryAccessApi;
use crate::identity::IdentityProbe;
use crate::loader::ModuleLoader;
use crate::manager::ConnectionManager;
use crate::module::{
    ModuleHost, ProxyRequest, ProxyResponse, RdpProxyDescriptor, SshChannel, SshServerType,
};
use crate::session::{HandleSlot, SessionBridge};
use crate::singleflight::Initializer;
use crate::store::{LifecycleState, LifecycleStore};
use meshgate_common::Result;
use std::sync::Arc;
use tokio::sync::watch;

/// Embedded network-client engine
pub struct ClientEngine {
    store: Arc<LifecycleStore>,
    initializer: Arc<Initializer>,
    manager: ConnectionManager,
    bridge: Arc<SessionBridge>,
}

impl ClientEngine {
    /// Wire an engine from configuration and its external collaborators
    pub fn new(
        config: ClientConfig,
        host: Arc<dyn ModuleHost>,
        grants: Arc<dyn TemporaryAccessApi>,
        identity: Arc<dyn IdentityProbe>,
    ) -> Self {
        let store = Arc::new(LifecycleStore::new());
        let loader = Arc::new(ModuleLoader::new(host, config.module.clone()));
        let handle: HandleSlot = Arc::new(tokio::sync::Mutex::new(None));
        let bridge = Arc::new(SessionBridge::new(handle.clone()));
        let initializer = Arc::new(Initializer::new(
            store.clone(),
            loader.clone(),
            bridge.clone(),
        ));
        let manager = ConnectionManager::new(
            store.clone(),
            loader,
            initializer.clone(),
            handle,
            grants,
            identity,
            config,
        );

        Self {
            store,
            initializer,
            manager,
            bridge,
        }
    }

    // ========================================================================
    // Observable state
    // ========================================================================

    /// Snapshot of the lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.store.state()
    }

    /// Subscribe to lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.store.subscribe()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Ensure the client module is loaded; safe to call concurrently
    pub async fn initialize(&self) -> Result<()> {
        self.initializer.initialize().await
    }

    /// Explicitly initialize RDP support; `false` means remote desktop
    /// is unavailable while basic tunneling still works
    pub fn initialize_rdp_bridge(&self) -> bool {
        self.bridge.initialize_rdp_bridge()
    }

    /// Connect with the supplied WireGuard private key
    pub async fn connect(&self, private_key: &str) -> bool {
        self.manager.connect(private_key).await
    }

    /// Connect through the ephemeral temporary-access flow
    pub async fn connect_temporary(
        &self,
        peer_id: &str,
        rules: Option<Vec<String>>,
    ) -> Result<bool> {
        self.manager.connect_temporary(peer_id, rules).await
    }

    /// Disconnect the active client handle
    pub async fn disconnect(&self) -> Result<()> {
        self.manager.disconnect().await
    }

    /// Release session sub-components at application teardown
    pub fn shutdown(&self) {
        self.bridge.shutdown();
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Session bridge for SSH/RDP/HTTP operations
    pub fn sessions(&self) -> &SessionBridge {
        &self.bridge
    }

    pub async fn detect_ssh_server_type(&self, host: &str, port: u16) -> Result<SshServerType> {
        self.bridge.detect_ssh_server_type(host, port).await
    }

    pub async fn create_ssh_connection(
        &self,
        host: &str,
        port: u16,
        username: &str,
    ) -> Result<Box<dyn SshChannel>> {
        self.bridge.create_ssh_connection(host, port, username).await
    }

    pub async fn make_request(&self, url: &str) -> Result<ProxyResponse> {
        self.bridge.make_request(url).await
    }

    pub async fn proxy_request(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        self.bridge.proxy_request(request).await
    }

    pub async fn setup_rdp_proxy(&self, hostname: &str, port: u16) -> Result<RdpProxyDescriptor> {
        self.bridge.setup_rdp_proxy(hostname, port).await
    }
}
