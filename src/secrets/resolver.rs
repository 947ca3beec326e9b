//! Resolves every secret under a root path into a flat map.
//!
//! Keys are stored exactly as the source lists them: case-sensitive, with no
//! derived aliases.

use super::env::Environment;
use super::types::{redact_secret, OrderPolicy, ResolvedSecrets, SecretSource};
use tracing::{debug, info};

/// List all keys under `root` and read each value.
///
/// With [`OrderPolicy::Override`], every resolved key that already exists in
/// `env` is overwritten with the resolved value. The returned map is the same
/// for every order.
pub async fn resolve_secrets(
    source: &dyn SecretSource,
    root: &str,
    order: OrderPolicy,
    env: &dyn Environment,
) -> ResolvedSecrets {
    let mut secrets = ResolvedSecrets::new();

    let keys = match source.list(root).await {
        Some(keys) if !keys.is_empty() => keys,
        _ => {
            info!(source = source.name(), root, "No secrets found");
            return secrets;
        }
    };

    for key in keys {
        let value = source.read(&secret_path(root, &key)).await;
        debug!(key = %key, value = %redact_secret(&value), "Resolved secret");
        secrets.insert(key, value);
    }

    if order == OrderPolicy::Override {
        for (key, value) in &secrets {
            if env.contains(key) {
                debug!(key = %key, "Overriding environment variable");
                env.set(key, value);
            }
        }
    }

    info!(
        source = source.name(),
        root,
        count = secrets.len(),
        "Resolved secrets"
    );
    secrets
}

/// `<root>/<key>`, or just `key` under an empty root.
pub fn secret_path(root: &str, key: &str) -> String {
    if root.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", root.trim_end_matches('/'), key)
    }
}
