//! Environment access for resolution and substitution.
//!
//! The `override` order writes resolved values back into the environment and
//! the `env` order reads from it. Both go through [`Environment`] so that tests
//! can run against an in-memory map instead of the process environment.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Whether `key` is present, even with an empty value.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// The real process environment.
///
/// Writes must happen before any child process is spawned so the child
/// inherits them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

/// The OS rejects empty names and names containing `=` or NUL.
fn valid_name(key: &str) -> bool {
    !key.is_empty() && !key.contains(|c| c == '=' || c == '\0')
}

impl Environment for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        if !valid_name(key) {
            return None;
        }
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }

    /// Names or values the OS cannot store are logged and skipped.
    fn set(&self, key: &str, value: &str) {
        if !valid_name(key) {
            warn!(key = %key, "Invalid environment variable name, not set");
            return;
        }
        if value.contains('\0') {
            warn!(key = %key, "Value contains a NUL byte, environment variable not set");
            return;
        }
        std::env::set_var(key, value);
    }

    fn remove(&self, key: &str) {
        if valid_name(key) {
            std::env::remove_var(key);
        }
    }
}

/// An isolated environment backed by a map.
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: Mutex::new(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.vars.lock().clone()
    }
}

impl Environment for MemoryEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.vars.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.vars.lock().remove(key);
    }
}
