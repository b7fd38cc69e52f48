//! Meshgate embedded network-client lifecycle manager
//!
//! Loads the opaque network-client module into the host process at most
//! once, drives its connect/disconnect state machine through an
//! observable lifecycle store, and multiplexes SSH, RDP, and HTTP proxy
//! sessions over the single live client handle.

pub mod config;
pub mod engine;
pub mod grant;
pub mod identity;
pub mod loader;
pub mod manager;
pub mod module;
pub mod session;
pub mod singleflight;
pub mod store;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use config::{ClientConfig, ModuleConfig};
pub use engine::ClientEngine;
pub use grant::{
    HttpTemporaryAccessApi, TemporaryAccessApi, TemporaryAccessGrant, TemporaryAccessRequest,
    DEFAULT_ACCESS_RULES,
};
pub use identity::{ephemeral_client_name, HostIdentity, IdentityProbe, SystemIdentityProbe};
pub use loader::ModuleLoader;
pub use manager::ConnectionManager;
pub use module::{
    ClientFactory, ClientHandle, ClientSettings, ModuleHost, ProxyRequest, ProxyResponse,
    RdpProxyDescriptor, SshChannel, SshServerType,
};
pub use session::{HandleSlot, RdpComponents, SessionBridge};
pub use singleflight::Initializer;
pub use store::{ConnectionStatus, LifecycleState, LifecycleStore, ModuleStatus};

pub use meshgate_common::{Error, Result, WgKeyPair};
