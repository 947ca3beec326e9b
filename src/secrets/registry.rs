//! Name → constructor registry for secret sources.

use std::collections::BTreeMap;

use super::file_source::FileSource;
use super::types::SecretSource;
use super::vault_source::VaultSource;
use crate::error::{Error, Result};

/// Options shared by every source constructor.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Root path: the key file for `file`, the secret prefix for `vault`.
    pub path: String,
    /// Vault address.
    pub address: Option<String>,
    /// Vault token, or a path to a file holding it.
    pub token: Option<String>,
}

pub type SourceFactory = fn(&SourceOptions) -> Result<Box<dyn SecretSource>>;

/// Available secret sources, keyed by name.
pub struct SourceRegistry {
    factories: BTreeMap<&'static str, SourceFactory>,
}

impl SourceRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory. A second registration under the same name is
    /// ignored so the first one stays in effect.
    pub fn register(&mut self, name: &'static str, factory: SourceFactory) {
        if self.factories.contains_key(name) {
            tracing::error!(name, "Source factory already registered, ignoring");
            return;
        }
        self.factories.insert(name, factory);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Fail with [`Error::UnknownSource`] unless `name` is registered.
    pub fn ensure_known(&self, name: &str) -> Result<()> {
        self.factory(name).map(|_| ())
    }

    /// Build the source registered under `name`.
    pub fn create(&self, name: &str, options: &SourceOptions) -> Result<Box<dyn SecretSource>> {
        let factory = self.factory(name)?;
        factory(options)
    }

    fn factory(&self, name: &str) -> Result<SourceFactory> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSource {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("file", file_factory);
        registry.register("vault", vault_factory);
        registry
    }
}

fn file_factory(options: &SourceOptions) -> Result<Box<dyn SecretSource>> {
    Ok(Box::new(FileSource::open(&options.path)?))
}

fn vault_factory(options: &SourceOptions) -> Result<Box<dyn SecretSource>> {
    if options.path.is_empty() {
        return Err(Error::config("Vault path must be defined (--path)"));
    }
    Ok(Box::new(VaultSource::new(
        options.address.as_deref(),
        options.token.as_deref(),
    )))
}
