//! Core traits and types for registry publishing
//!
//! This module defines the collaborators the orchestrator talks to: where
//! typings packages and additions come from, how the last published version
//! is looked up, and how a staged package gets published.

use crate::core::error::RegistryError;
use crate::orchestration::GeneratedManifest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Packages
// ============================================================================

/// One published typings package at one data version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingsPackage {
    /// Package name without the `@types/` scope (e.g. "jquery")
    pub name: String,
    /// Data version key the package was stored under (e.g. "3.5")
    pub version: String,
}

impl TypingsPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Last published version of a package on the remote registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: semver::Version,
}

// ============================================================================
// Collaborators
// ============================================================================

/// Source of all currently published typings packages
#[async_trait]
pub trait PackageReader: Send + Sync {
    async fn read_typings(&self) -> Result<Vec<TypingsPackage>, RegistryError>;
}

/// Source of the package names added since the last registry publish
#[async_trait]
pub trait AdditionsSource: Send + Sync {
    /// An empty vector is a valid, common result.
    async fn read_additions(&self) -> Result<Vec<String>, RegistryError>;
}

/// Remote version metadata lookup
#[async_trait]
pub trait VersionLookup: Send + Sync {
    /// Fetch the highest published version of `package`.
    ///
    /// Returns `Ok(None)` when the package has never been published, or when
    /// `exclude_prerelease` filters out every published version.
    async fn fetch_version_info(
        &self,
        package: &str,
        exclude_prerelease: bool,
    ) -> Result<Option<VersionInfo>, RegistryError>;
}

/// Client that uploads a staged package directory
#[async_trait]
pub trait PublishClient: Send + Sync {
    /// Publish the package staged in `directory`.
    ///
    /// With `dry` set, the client validates and packages but must not upload.
    async fn publish(
        &self,
        directory: &Path,
        manifest: &GeneratedManifest,
        dry: bool,
    ) -> Result<(), RegistryError>;
}

/// Async factory for publish clients
///
/// Clients are only created once a publish is actually going to happen, so a
/// run without additions never touches credentials.
#[async_trait]
pub trait PublishClientFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PublishClient>, RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typings_package_creation() {
        let package = TypingsPackage::new("jquery", "3.5");

        assert_eq!(package.name, "jquery");
        assert_eq!(package.version, "3.5");
    }

    #[test]
    fn test_version_info_patch() {
        let info = VersionInfo {
            version: semver::Version::parse("0.1.41").unwrap(),
        };

        assert_eq!(info.version.patch, 41);
    }
}
