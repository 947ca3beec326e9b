mod defaults;
mod validation;

pub use defaults::*;
pub use validation::*;

use std::path::PathBuf;

use crate::secrets::{OrderPolicy, SourceOptions};

/// Everything one run needs, merged from flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Registry name of the secret source (`vault`, `file`).
    pub source: String,
    pub source_options: SourceOptions,
    pub prefix: String,
    pub suffix: String,
    /// Files and directories to template.
    pub files: Vec<PathBuf>,
    pub order: OrderPolicy,
    /// Fail the run, before the handoff, when any file could not be templated.
    pub strict: bool,
    /// Command (and arguments) to exec once templating is done.
    pub command: Vec<String>,
}

impl RunConfig {
    pub fn new(source: impl Into<String>, source_options: SourceOptions) -> Self {
        Self {
            source: source.into(),
            source_options,
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            files: Vec::new(),
            order: OrderPolicy::default(),
            strict: false,
            command: Vec::new(),
        }
    }

    /// Root path under which secrets are listed.
    pub fn root_path(&self) -> &str {
        &self.source_options.path
    }
}

/// Split a comma-separated file list, dropping empty entries.
pub fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}
