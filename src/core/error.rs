//! Error handling for registry publishing
//!
//! This module provides the error type for every step of a registry run,
//! with error codes and recovery guidance, using the thiserror crate.

use crate::security::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for registry publishing operations
#[derive(Error, Debug)]
pub enum RegistryError {
    // Version lookup errors
    #[error("no published version found for registry package '{package}'")]
    MissingVersion { package: String },

    #[error("[{registry}] network error: {message}")]
    Network { registry: String, message: String },

    // I/O errors
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // Publishing errors
    #[error("generated manifest is invalid: {}", errors.join("; "))]
    InvalidManifest { errors: Vec<String> },

    #[error("no npm token found (set {env_var} or npm.tokenFile)")]
    TokenMissing { env_var: String },

    #[error("npm rejected the credentials")]
    AuthenticationFailed,

    #[error("version {version} is already published")]
    VersionConflict { version: String },

    #[error("publish failed: {message}")]
    PublishFailed { message: String },

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl RegistryError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Only transient lookup failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingVersion { .. } => vec![
                "Check that the registry package name is spelled correctly",
                "Publish an initial version of the registry package manually",
            ],
            Self::Network { .. } => vec![
                "Check your internet connection",
                "Check npm.registryUrl in the configuration",
                "Wait a moment and try again",
            ],
            Self::Io { .. } => vec![
                "Check that the path exists and is writable",
                "Check paths.* in the configuration",
            ],
            Self::Parse { .. } => vec!["Check that the data file contains valid JSON"],
            Self::Config(_) => vec!["Fix .types-registry.yaml or the overriding flags"],
            Self::InvalidManifest { .. } => vec!["Check the package.* section of the configuration"],
            Self::TokenMissing { .. } => vec![
                "Export the npm token (e.g. NPM_TOKEN)",
                "Or point npm.tokenFile at a file containing the token",
                "Use --dry to run without publishing",
            ],
            Self::AuthenticationFailed => vec![
                "Check that the token is valid and not expired",
                "Check that the token has publish rights for the package",
            ],
            Self::VersionConflict { .. } => vec![
                "Another run may have published concurrently; rerun to pick up the new patch",
            ],
            Self::PublishFailed { .. } => vec![
                "Check the npm output above",
                "Check the registry status",
            ],
            Self::Command(_) => vec![
                "Check that npm is installed and on PATH",
                "Raise npm.timeoutSecs if the upload is slow",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingVersion { .. } => "MISSING_VERSION",
            Self::Network { .. } => "NETWORK_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidManifest { .. } => "INVALID_MANIFEST",
            Self::TokenMissing { .. } => "TOKEN_MISSING",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::PublishFailed { .. } => "PUBLISH_FAILED",
            Self::Command(_) => "COMMAND_ERROR",
        }
    }
}
