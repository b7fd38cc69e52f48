//! Client configuration

use crate::grant::DEFAULT_ACCESS_RULES;
use serde::{Deserialize, Serialize};

/// Lifecycle manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Management endpoint origin the client handle is constructed with
    pub management_url: String,

    /// Log verbosity passed through to the client module
    pub log_level: String,

    /// Rules applied to temporary-access grants when the caller gives none
    pub default_access_rules: Vec<String>,

    /// Module loading behavior
    pub module: ModuleConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            management_url: "https://mgmt.meshgate.io".to_string(),
            log_level: "info".to_string(),
            default_access_rules: DEFAULT_ACCESS_RULES.iter().map(|r| r.to_string()).collect(),
            module: ModuleConfig::default(),
        }
    }
}

/// Module readiness polling
///
/// Module start and the constructor becoming callable are not
/// synchronized by any host signal, so readiness is polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Interval between entry-point presence probes
    pub ready_poll_interval_ms: u64,

    /// Deadline for the entry point to appear after instantiation
    pub ready_timeout_ms: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            ready_poll_interval_ms: 100,
            ready_timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
