//! Observable lifecycle state for the embedded network client
//!
//! The store is the single source of truth read by every other component
//! and by UI observers. All mutation funnels through full-state
//! replacement on a watch channel, so readers never observe a partially
//! applied transition.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// Connection status of the embedded client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
        }
    }
}

/// Readiness of the loaded client module
///
/// Independent axis from [`ConnectionStatus`]: the module can be
/// initialized while the connection is disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Uninitialized,
    Initializing,
    Initialized,
}

impl Default for ModuleStatus {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleStatus::Uninitialized => write!(f, "uninitialized"),
            ModuleStatus::Initializing => write!(f, "initializing"),
            ModuleStatus::Initialized => write!(f, "initialized"),
        }
    }
}

/// Full lifecycle state, replaced as one unit on every transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub connection: ConnectionStatus,
    pub module: ModuleStatus,
    pub last_error: String,
}

/// Shared observable state container
///
/// Created once per process and passed by reference to every component
/// that needs it; survives any number of UI observer churns.
pub struct LifecycleStore {
    tx: watch::Sender<LifecycleState>,
}

impl LifecycleStore {
    /// Create a new store in the initial state
    /// (disconnected, uninitialized, no error)
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::default());
        Self { tx }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> LifecycleState {
        self.tx.borrow().clone()
    }

    /// Current connection status
    pub fn connection(&self) -> ConnectionStatus {
        self.tx.borrow().connection
    }

    /// Current module status
    pub fn module(&self) -> ModuleStatus {
        self.tx.borrow().module
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Replace the connection status and error, notifying subscribers
    pub fn set_connection(&self, connection: ConnectionStatus, last_error: impl Into<String>) {
        let last_error = last_error.into();
        debug!("Connection status -> {} ({})", connection, last_error);
        self.tx.send_modify(|state| {
            state.connection = connection;
            state.last_error = last_error;
        });
    }

    /// Replace the module status and error, notifying subscribers
    pub fn set_module(&self, module: ModuleStatus, last_error: impl Into<String>) {
        let last_error = last_error.into();
        debug!("Module status -> {} ({})", module, last_error);
        self.tx.send_modify(|state| {
            state.module = module;
            state.last_error = last_error;
        });
    }

    /// Atomically claim module initialization
    ///
    /// Returns `true` when this caller moved the module from
    /// uninitialized to initializing and is now the initialization
    /// leader. Returns `false` when another caller already initialized
    /// the module or has an attempt in flight.
    pub fn try_begin_init(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.module == ModuleStatus::Uninitialized {
                state.module = ModuleStatus::Initializing;
                state.last_error.clear();
                true
            } else {
                false
            }
        })
    }

    /// Atomically claim a connect attempt
    ///
    /// Returns `false` when a connect is already in flight or the client
    /// is already connected, guaranteeing at most one caller reaches the
    /// handle construction step.
    pub fn try_begin_connect(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.connection == ConnectionStatus::Disconnected {
                state.connection = ConnectionStatus::Connecting;
                state.last_error.clear();
                true
            } else {
                false
            }
        })
    }
}

impl Default for LifecycleStore {
    fn default() -> Self {
        Self::new()
    }
}
