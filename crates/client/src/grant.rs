//! Temporary-access grant API
//!
//! Requests short-lived, scoped network-access grants for a target peer,
//! paired with an ephemeral key pair generated client-side.

use async_trait::async_trait;
use meshgate_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rules applied when the caller does not specify a set: the client's
/// built-in SSH server, RDP, and the HTTP proxy port
pub const DEFAULT_ACCESS_RULES: [&str; 3] = ["tcp/22022", "tcp/3389", "tcp/44338"];

/// Grant request body for `POST /peers/{id}/temporary-access`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporaryAccessRequest {
    pub name: String,
    pub wg_pub_key: String,
    pub rules: Vec<String>,
}

/// Issued grant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporaryAccessGrant {
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// External collaborator issuing temporary-access grants
#[async_trait]
pub trait TemporaryAccessApi: Send + Sync {
    async fn request_access(
        &self,
        peer_id: &str,
        request: &TemporaryAccessRequest,
    ) -> Result<TemporaryAccessGrant>;
}

/// REST implementation against the management API
pub struct HttpTemporaryAccessApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTemporaryAccessApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TemporaryAccessApi for HttpTemporaryAccessApi {
    async fn request_access(
        &self,
        peer_id: &str,
        request: &TemporaryAccessRequest,
    ) -> Result<TemporaryAccessGrant> {
        let url = format!("{}/peers/{}/temporary-access", self.base_url, peer_id);
        debug!("Requesting temporary access for peer {} ({})", peer_id, request.name);

        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Grant(format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(Error::Grant(format!("grant refused: {}", resp.status())));
        }

        resp.json()
            .await
            .map_err(|e| Error::Grant(format!("invalid grant response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = TemporaryAccessRequest {
            name: "firefox-128-temp".to_string(),
            wg_pub_key: "pubkey".to_string(),
            rules: DEFAULT_ACCESS_RULES.iter().map(|r| r.to_string()).collect(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["name"], "firefox-128-temp");
        assert_eq!(json["wg_pub_key"], "pubkey");
        assert_eq!(json["rules"][0], "tcp/22022");
        assert_eq!(json["rules"][1], "tcp/3389");
        assert_eq!(json["rules"][2], "tcp/44338");
    }

    #[test]
    fn test_grant_tolerates_empty_response() {
        let grant: TemporaryAccessGrant = serde_json::from_str("{}").unwrap();
        assert!(grant.expires_at.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpTemporaryAccessApi::new("https://mgmt.example.net/");
        assert_eq!(api.base_url, "https://mgmt.example.net");
    }
}
