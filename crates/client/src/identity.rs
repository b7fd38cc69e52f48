//! Host identity probe and ephemeral client naming
//!
//! Temporary-access peers get a human-readable name derived from the
//! host identity: lower-cased, hyphenated, restricted to [a-z0-9-].

use tracing::trace;

/// Name/version pair describing the host environment
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub name: String,
    pub version: String,
}

/// Supplies the host identity used for ephemeral client names
pub trait IdentityProbe: Send + Sync {
    fn identity(&self) -> HostIdentity;
}

/// Probe backed by the running platform
pub struct SystemIdentityProbe;

impl IdentityProbe for SystemIdentityProbe {
    fn identity(&self) -> HostIdentity {
        HostIdentity {
            name: std::env::consts::OS.to_string(),
            version: meshgate_common::VERSION.to_string(),
        }
    }
}

const MAX_NAME_LEN: usize = 32;

/// Derive an ephemeral client display name from a host identity
///
/// Non-alphanumeric runs collapse to a single hyphen; the result is
/// lower-cased, trimmed of edge hyphens, and capped at 32 characters.
pub fn ephemeral_client_name(identity: &HostIdentity) -> String {
    let raw = format!("{}-{}-temp", identity.name, identity.version);

    let mut name = String::with_capacity(raw.len());
    let mut prev_hyphen = true; // swallows leading separators
    for c in raw.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            name.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            name.push('-');
            prev_hyphen = true;
        }
    }

    name.truncate(MAX_NAME_LEN);
    while name.ends_with('-') {
        name.pop();
    }

    trace!("Derived ephemeral client name: {}", name);
    name
}
