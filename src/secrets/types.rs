//! Core types for secret resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ============================================================================
// Source Trait
// ============================================================================

/// A backend able to enumerate secret keys under a path and read their values.
///
/// Neither call reports errors: a failing backend lists nothing and reads an
/// empty string, so that a partially available store never blocks templating
/// of files that do not need the missing secrets.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Registry name of the source (`file`, `vault`).
    fn name(&self) -> &str;

    /// List the keys directly under `path`. `None` means "no keys".
    async fn list(&self, path: &str) -> Option<Vec<String>>;

    /// Read the value stored at `path`. Empty means "not found".
    async fn read(&self, path: &str) -> String;
}

/// Flat key → value mapping produced by one resolution pass.
pub type ResolvedSecrets = HashMap<String, String>;

// ============================================================================
// Order Policy
// ============================================================================

/// Precedence between a resolved secret and a same-named environment variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    /// The secret store value wins.
    #[default]
    Vault,
    /// A non-empty environment value wins during substitution.
    Env,
    /// Resolved values are written into existing environment variables, then
    /// used as-is.
    Override,
}

impl OrderPolicy {
    pub const ALL: [OrderPolicy; 3] = [OrderPolicy::Vault, OrderPolicy::Env, OrderPolicy::Override];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPolicy::Vault => "vault",
            OrderPolicy::Env => "env",
            OrderPolicy::Override => "override",
        }
    }
}

impl fmt::Display for OrderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderPolicy::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::config(format!(
                    "invalid order '{s}', must be one of: vault, env, override"
                ))
            })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Redact a secret value for display (show first 2 and last 2 chars).
pub fn redact_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}

// ============================================================================
// Tests
// ============================================================================
