//! Contracts for the opaque embedded network-client module
//!
//! The module itself (peer discovery, key exchange, packet routing) is an
//! external artifact; these traits describe only the surface the
//! lifecycle manager drives. The constructor capability is an explicit
//! reference resolved once after instantiation rather than a repeated
//! probe against ambient global state.

use async_trait::async_trait;
use meshgate_common::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Settings consumed by the client constructor
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// WireGuard private key, base64
    pub private_key: String,
    /// Management endpoint origin
    pub management_url: String,
    /// Log verbosity passed through to the module
    pub log_level: String,
}

/// SSH server flavor reported by the reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshServerType {
    /// The client's built-in SSH server on a peer
    Native,
    /// A standalone OpenSSH-compatible server
    OpenSsh,
    /// Endpoint reachable but does not speak SSH
    NotSsh,
}

/// Structured request proxied through the tunnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ProxyRequest {
    /// A plain GET for the given URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

/// Response from a proxied request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl ProxyResponse {
    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Descriptor for a locally opened RDP proxy endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdpProxyDescriptor {
    pub session_id: Uuid,
    /// Local WebSocket URL the remote-desktop renderer connects to
    pub local_url: String,
}

/// Interactive SSH channel opened through the tunnel
#[async_trait]
pub trait SshChannel: Send + Sync {
    async fn send(&self, data: &[u8]) -> Result<()>;
    async fn receive(&self) -> Result<Vec<u8>>;
    async fn close(&self) -> Result<()>;
}

/// One live instance of the embedded network client
///
/// Exclusively owned by the connection manager; the session bridge
/// borrows it per call and never stores its own reference.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;

    async fn detect_ssh_server_type(&self, host: &str, port: u16) -> Result<SshServerType>;
    async fn create_ssh_connection(
        &self,
        host: &str,
        port: u16,
        username: &str,
    ) -> Result<Box<dyn SshChannel>>;
    async fn make_request(&self, url: &str) -> Result<ProxyResponse>;
    async fn proxy_request(&self, request: ProxyRequest) -> Result<ProxyResponse>;
    async fn setup_rdp_proxy(&self, hostname: &str, port: u16) -> Result<RdpProxyDescriptor>;
}

/// Constructor capability published by the loaded module
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(&self, settings: ClientSettings) -> Result<Arc<dyn ClientHandle>>;
}

/// Host-process integration for fetching and starting the module
#[async_trait]
pub trait ModuleHost: Send + Sync {
    /// Whether the bytecode-execution support layer is already present
    fn runtime_ready(&self) -> bool;

    /// Fetch and attach the support layer
    async fn attach_runtime(&self) -> Result<()>;

    /// Instantiate the module against the support layer and start its
    /// run loop. Irreversible for the process lifetime.
    async fn instantiate(&self) -> Result<()>;

    /// The client constructor, once the module has published it
    fn client_factory(&self) -> Option<Arc<dyn ClientFactory>>;
}
