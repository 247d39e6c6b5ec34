//! npm publish client
//!
//! Publishes a staged package directory with `npm publish`. The token never
//! appears on the command line: npm reads it from `NODE_AUTH_TOKEN` through a
//! throwaway userconfig written next to the package directory.

use crate::core::config::NpmConfig;
use crate::core::error::RegistryError;
use crate::core::traits::{PublishClient, PublishClientFactory};
use crate::orchestration::GeneratedManifest;
use crate::security::{SafeCommandExecutor, SecureTokenManager};
use crate::storage::io::write_text;
use crate::validation::ManifestValidator;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

const AUTH_TOKEN_ENV: &str = "NODE_AUTH_TOKEN";

/// npm registry publish client
#[derive(Debug)]
pub struct NpmClient {
    registry_url: String,
    token: Option<SecretString>,
    token_env: String,
    timeout: Duration,
    validator: ManifestValidator,
}

impl NpmClient {
    /// Create a client, resolving the auth token from `config`
    ///
    /// A missing token is not an error here; only a real publish needs it.
    pub async fn create(config: &NpmConfig) -> Result<Self, RegistryError> {
        let manager = SecureTokenManager::new(&config.token_env, config.token_file.clone());
        let token = manager.get_token().await?;

        match &token {
            Some(token) => tracing::debug!(
                token = %SecureTokenManager::mask_token(token),
                "npm token loaded"
            ),
            None => tracing::debug!(env = %config.token_env, "no npm token configured"),
        }

        Ok(Self {
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            token,
            token_env: config.token_env.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            validator: ManifestValidator::new(),
        })
    }

    /// `.npmrc` line granting the token for the configured registry
    fn npmrc_contents(&self) -> String {
        let without_scheme = self
            .registry_url
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.registry_url);
        format!("{}/:_authToken=${{{}}}\n", without_scheme, AUTH_TOKEN_ENV)
    }

    /// Userconfig location: beside the package directory, never inside it
    fn npmrc_path(directory: &Path, manifest: &GeneratedManifest) -> PathBuf {
        let file_name = format!(".npmrc-{}", manifest.name.replace('/', "-"));
        match directory.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    async fn run_npm_publish(
        &self,
        directory: &Path,
        npmrc: &Path,
        token: &SecretString,
    ) -> Result<std::process::Output, RegistryError> {
        let mut executor = SafeCommandExecutor::new(directory)?;
        executor.set_timeout(self.timeout);
        executor.set_env(AUTH_TOKEN_ENV, token.expose_secret());

        let args: Vec<OsString> = vec![
            "publish".into(),
            directory.as_os_str().to_owned(),
            "--userconfig".into(),
            npmrc.as_os_str().to_owned(),
            "--registry".into(),
            self.registry_url.clone().into(),
        ];

        Ok(executor.execute("npm", &args).await?)
    }
}

/// Map npm's stderr on a failed publish to an error
pub fn classify_publish_failure(stderr: &str, version: &str) -> RegistryError {
    if stderr.contains("E401") || stderr.contains("ENEEDAUTH") || stderr.contains("E403") {
        RegistryError::AuthenticationFailed
    } else if stderr.contains("EPUBLISHCONFLICT") || stderr.contains("cannot publish over") {
        RegistryError::VersionConflict {
            version: version.to_string(),
        }
    } else {
        RegistryError::PublishFailed {
            message: stderr.trim().to_string(),
        }
    }
}

#[async_trait]
impl PublishClient for NpmClient {
    async fn publish(
        &self,
        directory: &Path,
        manifest: &GeneratedManifest,
        dry: bool,
    ) -> Result<(), RegistryError> {
        let validation = self.validator.validate(directory, manifest).await?;
        for warning in &validation.warnings {
            tracing::warn!("{}", warning);
        }
        if !validation.is_valid {
            return Err(RegistryError::InvalidManifest {
                errors: validation.errors,
            });
        }

        if dry {
            tracing::info!(
                "(dry) would publish {}@{}: {} files, {} bytes",
                manifest.name,
                manifest.version,
                validation.files.len(),
                validation.total_size
            );
            for file in &validation.files {
                tracing::debug!("(dry)   {} ({} bytes)", file.path.display(), file.size);
            }
            return Ok(());
        }

        let token = self.token.as_ref().ok_or_else(|| RegistryError::TokenMissing {
            env_var: self.token_env.clone(),
        })?;

        let npmrc = Self::npmrc_path(directory, manifest);
        write_text(&npmrc, &self.npmrc_contents()).await?;

        let result = self.run_npm_publish(directory, &npmrc, token).await;

        if let Err(e) = tokio::fs::remove_file(&npmrc).await {
            tracing::warn!(path = %npmrc.display(), "failed to remove npm userconfig: {}", e);
        }

        let output = result?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = SecureTokenManager::mask_token_in_string(&stderr, token);
            return Err(classify_publish_failure(&stderr, &manifest.version));
        }

        tracing::info!("published {}@{}", manifest.name, manifest.version);
        Ok(())
    }
}

/// Factory creating [`NpmClient`]s from configuration
#[derive(Debug, Clone)]
pub struct NpmClientFactory {
    config: NpmConfig,
}

impl NpmClientFactory {
    pub fn new(config: NpmConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PublishClientFactory for NpmClientFactory {
    async fn create(&self) -> Result<Box<dyn PublishClient>, RegistryError> {
        Ok(Box::new(NpmClient::create(&self.config).await?))
    }
}
