use std::fmt;
use std::path::PathBuf;

/// Errors surfaced by the library.
///
/// Backend failures of a [`crate::secrets::SecretSource`] never show up
/// here: sources downgrade them to "no keys" / "empty value" and log a
/// warning instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required argument is missing or malformed. Raised before any I/O.
    #[error("{0}")]
    Config(String),

    /// The requested secret source is not registered.
    #[error("invalid source name '{name}', must be one of: {available}")]
    UnknownSource { name: String, available: String },

    /// A file or directory could not be opened, read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more target files could not be templated.
    #[error("failed to template {} file(s): {}", .0.len(), FailureList(.0))]
    Template(Vec<FileFailure>),

    /// The handoff command could not be executed.
    #[error("failed to execute '{program}': {reason}")]
    Exec { program: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single path that failed during templating, with its cause.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            // Io errors already carry the path.
            Error::Io { .. } => write!(f, "{}", self.error),
            other => write!(f, "{}: {}", self.path.display(), other),
        }
    }
}

struct FailureList<'a>(&'a [FileFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
