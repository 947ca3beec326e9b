//! Secret resolution and in-place file templating.
//!
//! A [`secrets::SecretSource`] (a Vault KV mount or a local `key=value`
//! file) is selected by name through the [`secrets::SourceRegistry`], every
//! key under a root path is resolved into a flat map, and the
//! [`template::TemplateEngine`] substitutes those values into placeholder
//! tokens found in a list of files and directories. The binary then hands
//! off to the command given after `--`.

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod secrets;
pub mod template;

pub use error::{Error, Result};
