//! Meshgate Common Library
//!
//! Shared error types and key utilities for the Meshgate platform.

pub mod error;
pub mod keys;

// Re-export commonly used types
pub use error::{Error, Result};
pub use keys::WgKeyPair;

/// Meshgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
