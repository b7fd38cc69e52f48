//! Key utilities for Meshgate
//!
//! Provides WireGuard-style x25519 key pair generation for ephemeral
//! temporary-access credentials.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

/// WireGuard key pair, base64-encoded
#[derive(Clone)]
pub struct WgKeyPair {
    pub private_key: String,
    pub public_key: String,
}

impl WgKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let mut private_key_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut private_key_bytes);

        // Curve25519 clamping
        private_key_bytes[0] &= 248;
        private_key_bytes[31] &= 127;
        private_key_bytes[31] |= 64;

        let secret = StaticSecret::from(private_key_bytes);
        let public = PublicKey::from(&secret);

        Self {
            private_key: STANDARD.encode(private_key_bytes),
            public_key: STANDARD.encode(public.as_bytes()),
        }
    }
}

impl std::fmt::Debug for WgKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Private key stays out of logs
        f.debug_struct("WgKeyPair")
            .field("public_key", &self.public_key)
            .finish()
    }
}
