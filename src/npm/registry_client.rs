//! npm registry metadata client
//!
//! Looks up the versions a package has on the registry. Used to find the last
//! published version of the registry package itself.

use crate::core::config::NpmConfig;
use crate::core::error::RegistryError;
use crate::core::retry::{RetryManager, RetryOptions};
use crate::core::traits::{VersionInfo, VersionLookup};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;

/// npm registry package document (only the parts we read)
#[derive(Debug, Deserialize)]
struct NpmRegistryInfo {
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

/// Pick the highest version, optionally skipping prereleases
///
/// Keys that are not valid SemVer are ignored.
pub fn latest_version<'a>(
    versions: impl IntoIterator<Item = &'a str>,
    exclude_prerelease: bool,
) -> Option<semver::Version> {
    versions
        .into_iter()
        .filter_map(|v| semver::Version::parse(v).ok())
        .filter(|v| !exclude_prerelease || v.pre.is_empty())
        .max()
}

/// Escape a package name for use in a registry URL path
///
/// `@types/node` becomes `@types%2fnode`.
pub fn escape_package_name(package: &str) -> String {
    package.replace('/', "%2f")
}

/// npm registry client implementing [`VersionLookup`]
#[derive(Debug, Clone)]
pub struct NpmRegistryClient {
    client: reqwest::Client,
    registry_url: String,
    retry: RetryManager,
}

impl NpmRegistryClient {
    pub fn new(config: &NpmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            retry: RetryManager::new(RetryOptions::from(&config.retry)),
        }
    }

    fn package_url(&self, package: &str) -> String {
        format!("{}/{}", self.registry_url, escape_package_name(package))
    }

    fn network_error(&self, message: impl Into<String>) -> RegistryError {
        RegistryError::Network {
            registry: self.registry_url.clone(),
            message: message.into(),
        }
    }

    /// Fetch package info from the registry, `None` if the package is unknown
    async fn fetch_package_info(&self, package: &str) -> Result<Option<NpmRegistryInfo>, RegistryError> {
        let url = self.package_url(package);
        tracing::debug!(%url, "fetching package info");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.network_error(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.network_error(format!("GET {} returned HTTP {}", url, response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.network_error(e.to_string()))?;
        let info = serde_json::from_slice::<NpmRegistryInfo>(&body).map_err(|e| RegistryError::Parse {
            path: url.into(),
            message: e.to_string(),
        })?;

        Ok(Some(info))
    }
}

#[async_trait]
impl VersionLookup for NpmRegistryClient {
    async fn fetch_version_info(
        &self,
        package: &str,
        exclude_prerelease: bool,
    ) -> Result<Option<VersionInfo>, RegistryError> {
        let info = self
            .retry
            .retry(|| self.fetch_package_info(package))
            .await?;

        Ok(info.and_then(|info| {
            latest_version(info.versions.keys().map(String::as_str), exclude_prerelease)
                .map(|version| VersionInfo { version })
        }))
    }
}
