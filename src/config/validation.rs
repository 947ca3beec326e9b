use super::RunConfig;
use crate::error::Error;

/// Validation errors for a run configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.field)
    }
}

/// Validate a run configuration before any I/O happens.
pub fn validate_config(config: &RunConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.source_options.path.trim().is_empty() {
        let what = match config.source.as_str() {
            "vault" => "Vault path",
            "file" => "File path",
            _ => "Path",
        };
        errors.push(ConfigValidationError {
            field: "--path".to_string(),
            message: format!("{what} must be defined"),
        });
    }

    if config.suffix.is_empty() {
        errors.push(ConfigValidationError {
            field: "--suffix".to_string(),
            message: "Placeholder suffix must not be empty".to_string(),
        });
    }

    errors
}

/// Turn validation errors into a single fatal [`Error::Config`].
pub fn ensure_valid(config: &RunConfig) -> Result<(), Error> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::Config(message))
}
