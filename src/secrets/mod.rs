//! Secret sources and resolution.
//!
//! 1. **Select**: pick a [`SecretSource`] by name from the [`SourceRegistry`]
//! 2. **Resolve**: list every key under a root path and read its value
//! 3. **Apply order**: with `override`, push resolved values into the
//!    environment before anything is spawned

pub mod env;
pub mod file_source;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod vault_source;

pub use env::{Environment, MemoryEnvironment, ProcessEnvironment};
pub use file_source::FileSource;
pub use registry::{SourceOptions, SourceRegistry};
pub use resolver::resolve_secrets;
pub use types::{OrderPolicy, ResolvedSecrets, SecretSource};
pub use vault_source::VaultSource;
