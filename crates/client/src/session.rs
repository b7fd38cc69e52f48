//! Session operations layered on the active client handle
//!
//! SSH probing, SSH channels, HTTP proxying, and RDP proxy setup all
//! borrow the one live handle per call; nothing here implements protocol
//! logic. Every operation fails fast with "client not ready" when no
//! handle is live.

use crate::module::{
    ClientHandle, ProxyRequest, ProxyResponse, RdpProxyDescriptor, SshChannel, SshServerType,
};
use meshgate_common::{Error, Result};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Shared slot holding the single active client handle
///
/// Owned by the connection manager; the bridge reads it per call so a
/// reconnect can never leave the bridge pointing at a stale handle.
pub type HandleSlot = Arc<tokio::sync::Mutex<Option<Arc<dyn ClientHandle>>>>;

/// Interception layer routing local WebSocket upgrades into RDP proxy
/// sessions; installed once for the process lifetime
pub struct WsInterceptor {
    installed: AtomicBool,
}

impl WsInterceptor {
    fn install() -> Self {
        debug!("WebSocket interception layer installed");
        Self {
            installed: AtomicBool::new(true),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn uninstall(&self) {
        self.installed.store(false, Ordering::SeqCst);
    }
}

/// Records operator-approved TLS certificate fingerprints for RDP targets
pub struct CertificateHandler {
    accepted: Mutex<HashSet<String>>,
}

impl CertificateHandler {
    fn new() -> Self {
        Self {
            accepted: Mutex::new(HashSet::new()),
        }
    }

    pub fn accept(&self, fingerprint: &str) {
        self.accepted.lock().unwrap().insert(fingerprint.to_string());
    }

    pub fn is_accepted(&self, fingerprint: &str) -> bool {
        self.accepted.lock().unwrap().contains(fingerprint)
    }
}

/// Lazily constructed RDP support: the frame sub-bridge, certificate
/// handling, and the WebSocket interception layer
///
/// Built once per process, shared by reference across all RDP session
/// requests, and released only through [`RdpComponents::shutdown`].
pub struct RdpComponents {
    interceptor: WsInterceptor,
    certificates: CertificateHandler,
    sessions: Mutex<Vec<Uuid>>,
}

impl RdpComponents {
    fn new() -> Result<Self> {
        Ok(Self {
            interceptor: WsInterceptor::install(),
            certificates: CertificateHandler::new(),
            sessions: Mutex::new(Vec::new()),
        })
    }

    pub fn certificates(&self) -> &CertificateHandler {
        &self.certificates
    }

    pub fn interceptor(&self) -> &WsInterceptor {
        &self.interceptor
    }

    fn register_session(&self, session_id: Uuid) {
        self.sessions.lock().unwrap().push(session_id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Release at application teardown
    fn shutdown(&self) {
        self.interceptor.uninstall();
        self.sessions.lock().unwrap().clear();
        debug!("RDP sub-components released");
    }
}

/// Session façade over the single client handle
pub struct SessionBridge {
    handle: HandleSlot,
    rdp: OnceCell<RdpComponents>,
}

impl SessionBridge {
    pub fn new(handle: HandleSlot) -> Self {
        Self {
            handle,
            rdp: OnceCell::new(),
        }
    }

    /// The live handle, or "client not ready"
    async fn current_handle(&self) -> Result<Arc<dyn ClientHandle>> {
        self.handle.lock().await.clone().ok_or(Error::NotReady)
    }

    /// Probe whether a reachable endpoint speaks SSH, and which flavor
    pub async fn detect_ssh_server_type(&self, host: &str, port: u16) -> Result<SshServerType> {
        let handle = self.current_handle().await?;
        handle.detect_ssh_server_type(host, port).await
    }

    /// Open an interactive SSH channel through the tunnel
    pub async fn create_ssh_connection(
        &self,
        host: &str,
        port: u16,
        username: &str,
    ) -> Result<Box<dyn SshChannel>> {
        let handle = self.current_handle().await?;
        debug!("Opening SSH channel to {}:{} as {}", host, port, username);
        handle.create_ssh_connection(host, port, username).await
    }

    /// Issue a single HTTP GET from inside the private network
    pub async fn make_request(&self, url: &str) -> Result<ProxyResponse> {
        let handle = self.current_handle().await?;
        handle.make_request(url).await
    }

    /// Issue a structured proxy request through the tunnel
    pub async fn proxy_request(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        let handle = self.current_handle().await?;
        handle.proxy_request(request).await
    }

    /// Open a local proxy endpoint for a remote-desktop target
    ///
    /// The RDP sub-components are prerequisites constructed during
    /// initialization, not here.
    pub async fn setup_rdp_proxy(&self, hostname: &str, port: u16) -> Result<RdpProxyDescriptor> {
        let handle = self.current_handle().await?;
        let rdp = self
            .rdp
            .get()
            .ok_or_else(|| Error::Session("RDP support is not initialized".to_string()))?;

        let descriptor = handle.setup_rdp_proxy(hostname, port).await?;
        rdp.register_session(descriptor.session_id);
        debug!(
            "RDP proxy ready for {}:{} at {}",
            hostname, port, descriptor.local_url
        );
        Ok(descriptor)
    }

    /// Construct the RDP sub-components, once
    ///
    /// Idempotent; called by the initializer during module bring-up.
    pub fn ensure_rdp_components(&self) -> Result<()> {
        self.rdp.get_or_try_init(|| {
            let components = RdpComponents::new()?;
            debug!("RDP sub-bridge constructed");
            Ok::<_, Error>(components)
        })?;
        Ok(())
    }

    /// Explicitly initialize RDP support
    ///
    /// Reports success as a boolean so the caller can render a degraded
    /// state while basic tunneling keeps working.
    pub fn initialize_rdp_bridge(&self) -> bool {
        match self.ensure_rdp_components() {
            Ok(()) => true,
            Err(e) => {
                warn!("RDP bridge initialization failed: {}", e);
                false
            }
        }
    }

    /// Whether RDP support has been constructed
    pub fn rdp_ready(&self) -> bool {
        self.rdp.get().is_some()
    }

    /// Access the RDP sub-components, if constructed
    pub fn rdp(&self) -> Option<&RdpComponents> {
        self.rdp.get()
    }

    /// Release RDP sub-components at application teardown
    pub fn shutdown(&self) {
        if let Some(rdp) = self.rdp.get() {
            rdp.shutdown();
        }
    }
}
