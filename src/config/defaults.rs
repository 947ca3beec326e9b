/// Default configuration constants used across the system.

/// Default placeholder prefix (a regular expression fragment).
pub const DEFAULT_PREFIX: &str = "{";

/// Default placeholder suffix (a regular expression fragment).
pub const DEFAULT_SUFFIX: &str = "}";

/// Default order of precedence between secrets and the environment.
pub const DEFAULT_ORDER: &str = "vault";

/// Environment variable holding the Vault token; scrubbed before exec.
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

/// Default tracing directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_DIRECTIVE: &str = "secret_getter=info";
