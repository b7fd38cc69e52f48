//! Shared test doubles for the lifecycle manager

use crate::grant::{TemporaryAccessApi, TemporaryAccessGrant, TemporaryAccessRequest};
use crate::identity::{HostIdentity, IdentityProbe};
use crate::module::{
    ClientFactory, ClientHandle, ClientSettings, ModuleHost, ProxyRequest, ProxyResponse,
    RdpProxyDescriptor, SshChannel, SshServerType,
};
use async_trait::async_trait;
use meshgate_common::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

/// Host integration double with controllable failure and publication
pub struct MockModuleHost {
    pub attach_calls: AtomicUsize,
    pub instantiate_calls: AtomicUsize,
    pub fail_attach: AtomicBool,
    pub fail_instantiate: AtomicBool,
    runtime_attached: AtomicBool,
    publish_on_instantiate: AtomicBool,
    factory: Arc<MockClientFactory>,
    published: Mutex<Option<Arc<dyn ClientFactory>>>,
}

impl MockModuleHost {
    /// Host that publishes the constructor as soon as the module starts
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attach_calls: AtomicUsize::new(0),
            instantiate_calls: AtomicUsize::new(0),
            fail_attach: AtomicBool::new(false),
            fail_instantiate: AtomicBool::new(false),
            runtime_attached: AtomicBool::new(false),
            publish_on_instantiate: AtomicBool::new(true),
            factory: MockClientFactory::new(),
            published: Mutex::new(None),
        })
    }

    /// Host whose module never publishes a constructor on its own
    pub fn without_factory() -> Arc<Self> {
        let host = Self::new();
        host.publish_on_instantiate.store(false, Ordering::SeqCst);
        host
    }

    /// Make the constructor visible to `client_factory` immediately
    pub fn publish_factory_now(&self) {
        *self.published.lock().unwrap() = Some(self.factory.clone() as Arc<dyn ClientFactory>);
    }

    pub fn factory(&self) -> Arc<MockClientFactory> {
        self.factory.clone()
    }

    pub fn handle(&self) -> Arc<MockClientHandle> {
        self.factory.handle()
    }
}

#[async_trait]
impl ModuleHost for MockModuleHost {
    fn runtime_ready(&self) -> bool {
        self.runtime_attached.load(Ordering::SeqCst)
    }

    async fn attach_runtime(&self) -> Result<()> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(Error::ModuleLoad("runtime fetch failed".to_string()));
        }
        self.runtime_attached.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn instantiate(&self) -> Result<()> {
        self.instantiate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_instantiate.load(Ordering::SeqCst) {
            return Err(Error::ModuleLoad("instantiation failed".to_string()));
        }
        if self.publish_on_instantiate.load(Ordering::SeqCst) {
            self.publish_factory_now();
        }
        Ok(())
    }

    fn client_factory(&self) -> Option<Arc<dyn ClientFactory>> {
        self.published.lock().unwrap().clone()
    }
}

/// Constructor capability double
pub struct MockClientFactory {
    pub create_calls: AtomicUsize,
    pub fail_create: AtomicBool,
    pub last_settings: Mutex<Option<ClientSettings>>,
    handle: Arc<MockClientHandle>,
}

impl MockClientFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            create_calls: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            last_settings: Mutex::new(None),
            handle: MockClientHandle::new(),
        })
    }

    pub fn handle(&self) -> Arc<MockClientHandle> {
        self.handle.clone()
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn create(&self, settings: ClientSettings) -> Result<Arc<dyn ClientHandle>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_settings.lock().unwrap() = Some(settings);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Connection("constructor rejected settings".to_string()));
        }
        Ok(self.handle.clone() as Arc<dyn ClientHandle>)
    }
}

/// Client handle double; sessions are counted, never performed
pub struct MockClientHandle {
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub fail_start: AtomicBool,
    stop_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockClientHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            session_calls: AtomicUsize::new(0),
            fail_start: AtomicBool::new(false),
            stop_gate: Mutex::new(None),
        })
    }

    /// Block `stop` until the returned gate is notified
    pub fn gate_stop(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.stop_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ClientHandle for MockClientHandle {
    async fn start(&self) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::Connection("management handshake refused".to_string()));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let gate = self.stop_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn detect_ssh_server_type(&self, _host: &str, port: u16) -> Result<SshServerType> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(if port == 22022 {
            SshServerType::Native
        } else {
            SshServerType::OpenSsh
        })
    }

    async fn create_ssh_connection(
        &self,
        _host: &str,
        _port: u16,
        _username: &str,
    ) -> Result<Box<dyn SshChannel>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSshChannel))
    }

    async fn make_request(&self, url: &str) -> Result<ProxyResponse> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProxyResponse {
            status: 200,
            headers: Default::default(),
            body: format!(r#"{{"url":"{}"}}"#, url),
        })
    }

    async fn proxy_request(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProxyResponse {
            status: 200,
            headers: request.headers,
            body: request.url,
        })
    }

    async fn setup_rdp_proxy(&self, hostname: &str, port: u16) -> Result<RdpProxyDescriptor> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RdpProxyDescriptor {
            session_id: Uuid::new_v4(),
            local_url: format!("ws://127.0.0.1:7064/rdp/{}:{}", hostname, port),
        })
    }
}

/// SSH channel double
pub struct MockSshChannel;

#[async_trait]
impl SshChannel for MockSshChannel {
    async fn send(&self, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<u8>> {
        Ok(b"$ ".to_vec())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Grant API double recording the last request
pub struct MockGrantApi {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub last_request: Mutex<Option<(String, TemporaryAccessRequest)>>,
    request_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockGrantApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            last_request: Mutex::new(None),
            request_gate: Mutex::new(None),
        })
    }

    /// Block `request_access` until the returned gate is notified
    pub fn gate_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.request_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl TemporaryAccessApi for MockGrantApi {
    async fn request_access(
        &self,
        peer_id: &str,
        request: &TemporaryAccessRequest,
    ) -> Result<TemporaryAccessGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.request_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        *self.last_request.lock().unwrap() = Some((peer_id.to_string(), request.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Grant("grant refused: 403 Forbidden".to_string()));
        }
        Ok(TemporaryAccessGrant::default())
    }
}

/// Identity probe double with a fixed name/version pair
pub struct FixedIdentityProbe {
    pub name: String,
    pub version: String,
}

impl FixedIdentityProbe {
    pub fn new(name: &str, version: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl IdentityProbe for FixedIdentityProbe {
    fn identity(&self) -> HostIdentity {
        HostIdentity {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}
