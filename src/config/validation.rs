//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.console_name is required")]
    MissingConsoleName,
    #[error("server.world_file is required")]
    MissingWorldFile,
    #[error("limits.help_page_size must be at least 1")]
    ZeroPageSize,
    #[error("limits.name_search_threshold must be at least 1")]
    ZeroSearchThreshold,
    #[error("limits.choice_ttl_secs must be at least 1")]
    ZeroChoiceTtl,
    #[error("rate_limits.commands_per_second must be at least 1")]
    ZeroCommandRate,
    #[error("storage path parent directory does not exist: {0}")]
    StoragePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.console_name.trim().is_empty() {
        errors.push(ValidationError::MissingConsoleName);
    }
    if config.server.world_file.trim().is_empty() {
        errors.push(ValidationError::MissingWorldFile);
    }
    if config.limits.help_page_size == 0 {
        errors.push(ValidationError::ZeroPageSize);
    }
    if config.limits.name_search_threshold == 0 {
        errors.push(ValidationError::ZeroSearchThreshold);
    }
    if config.limits.choice_ttl_secs == 0 {
        errors.push(ValidationError::ZeroChoiceTtl);
    }
    if config.rate_limits.commands_per_second == 0 {
        errors.push(ValidationError::ZeroCommandRate);
    }

    // The audit log is appended to, never created with parents.
    if let Some(path) = config.storage.audit_path.as_deref()
        && let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::StoragePathInvalid(path.display().to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
