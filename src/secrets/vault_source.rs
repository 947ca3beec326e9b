//! HashiCorp Vault secret source.
//!
//! Lists keys with `GET /v1/<path>?list=true` and reads each secret's
//! `value` field with `GET /v1/<path>`. Failures are logged and reported as
//! "no keys" / "empty value"; nothing is cached, every call hits the server.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use super::types::SecretSource;

/// Address used when neither an explicit address nor `VAULT_ADDR` is set.
pub const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

const TOKEN_HEADER: &str = "X-Vault-Token";

pub struct VaultSource {
    address: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct VaultResponse {
    #[serde(default)]
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl VaultSource {
    /// Create a source for `address` (falls back to `VAULT_ADDR`, then the
    /// local default) authenticated with `token` (falls back to
    /// `VAULT_TOKEN`). A token naming a readable file is replaced by the
    /// file's trimmed contents.
    pub fn new(address: Option<&str>, token: Option<&str>) -> Self {
        Self::with_client(address, token, Client::new())
    }

    pub fn with_client(address: Option<&str>, token: Option<&str>, client: Client) -> Self {
        let address = non_empty(address)
            .map(String::from)
            .or_else(|| std::env::var("VAULT_ADDR").ok().filter(|a| !a.is_empty()))
            .unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string());

        let token = match non_empty(token) {
            Some(token) => resolve_token(token),
            None => std::env::var("VAULT_TOKEN").ok().filter(|t| !t.is_empty()),
        };

        Self {
            address,
            token,
            client,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.address.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn fetch(&self, path: &str, list: bool) -> Result<VaultResponse, reqwest::Error> {
        let mut request = self.client.get(self.url(path));
        if list {
            request = request.query(&[("list", "true")]);
        }
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        request
            .send()
            .await?
            .error_for_status()?
            .json::<VaultResponse>()
            .await
    }
}

impl std::fmt::Debug for VaultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSource")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Use the trimmed contents of `token` when it names a regular file,
/// otherwise the literal string. An empty token file leaves the token unset.
fn resolve_token(token: &str) -> Option<String> {
    let path = Path::new(token);
    if !path.is_file() {
        return Some(token.to_string());
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                warn!(path = %path.display(), "Vault token file is empty");
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read Vault token file");
            None
        }
    }
}

#[async_trait]
impl SecretSource for VaultSource {
    fn name(&self) -> &str {
        "vault"
    }

    async fn list(&self, path: &str) -> Option<Vec<String>> {
        let response = match self.fetch(path, true).await {
            Ok(response) => response,
            Err(e) => {
                warn!(path, error = %e, "Failed to list keys");
                return None;
            }
        };

        let keys: Vec<String> = response
            .data
            .as_ref()
            .and_then(|data| data.get("keys"))
            .and_then(|keys| keys.as_array())
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| k.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        if keys.is_empty() {
            warn!(path, "No keys found");
            return None;
        }
        debug!(path, count = keys.len(), "Listed keys");
        Some(keys)
    }

    async fn read(&self, path: &str) -> String {
        let response = match self.fetch(path, false).await {
            Ok(response) => response,
            Err(e) => {
                warn!(path, error = %e, "Failed to read secret");
                return String::new();
            }
        };

        match response
            .data
            .as_ref()
            .and_then(|data| data.get("value"))
            .and_then(|value| value.as_str())
        {
            Some(value) => value.to_string(),
            None => {
                warn!(path, "Secret has no string 'value' field");
                String::new()
            }
        }
    }
}
