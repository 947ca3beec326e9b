//! Local key file secret source.
//!
//! Reads a flat `key = value` file once at construction. Keys cannot contain
//! whitespace, `|` or `=`; values are taken verbatim (quotes included) up to
//! the end of the line. Lines that do not look like an assignment are skipped.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::types::SecretSource;
use crate::error::{Error, Result};

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<key>[^[:space:]|=]+)\s*=\s*(?P<value>.*)$").unwrap()
});

/// Secrets parsed from a local key file.
#[derive(Debug, Clone)]
pub struct FileSource {
    /// The key file path, also the namespace that `read` strips.
    root: String,
    secrets: HashMap<String, String>,
}

impl FileSource {
    /// Parse the key file at `path`.
    pub fn open(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::config("file path must be defined (--path)"));
        }

        let metadata = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if metadata.is_dir() {
            return Err(Error::io(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file path must be a file, not a directory (--path)",
                ),
            ));
        }

        let content = std::fs::read_to_string(Path::new(path)).map_err(|e| Error::io(path, e))?;
        let secrets = parse_key_file(&content);
        debug!(path, keys = secrets.len(), "Loaded key file");

        Ok(Self {
            root: path.to_string(),
            secrets,
        })
    }

    /// Build a source from already parsed content, rooted at `root`.
    pub fn from_content(root: &str, content: &str) -> Self {
        Self {
            root: root.to_string(),
            secrets: parse_key_file(content),
        }
    }

    /// Strip the `<root>/` namespace from a fully qualified path.
    fn key_for<'a>(&self, path: &'a str) -> &'a str {
        match path.strip_prefix(self.root.as_str()) {
            Some(rest) if rest.starts_with('/') => &rest[1..],
            _ => path,
        }
    }
}

/// Parse `key = value` lines. A repeated key keeps its last value.
pub fn parse_key_file(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let caps = ASSIGNMENT.captures(line)?;
            let key = caps.name("key")?.as_str();
            let value = caps.name("value").map_or("", |m| m.as_str());
            Some((key.to_string(), value.trim_end().to_string()))
        })
        .collect()
}

#[async_trait]
impl SecretSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    /// Key files are flat, so `path` is ignored.
    async fn list(&self, _path: &str) -> Option<Vec<String>> {
        let mut keys: Vec<String> = self.secrets.keys().cloned().collect();
        keys.sort();
        Some(keys)
    }

    async fn read(&self, path: &str) -> String {
        self.secrets
            .get(self.key_for(path))
            .cloned()
            .unwrap_or_default()
    }
}
