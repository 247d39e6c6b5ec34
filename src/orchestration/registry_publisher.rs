//! Registry Publisher - main orchestrator of a registry release
//!
//! One run is strictly sequential:
//! 1. Check for additions since the last release (stop if there are none)
//! 2. Read all typings packages
//! 3. Build manifest and registry document
//! 4. Write the package to the output directory
//! 5. Create a publish client and publish (or dry run)
//!
//! [`RegistryPublisher::run_and_persist`] additionally writes the run's
//! transcript to the logs directory, whatever the outcome.

use crate::core::config::RegistryConfig;
use crate::core::error::RegistryError;
use crate::core::logging::{RunLog, write_log};
use crate::core::traits::{AdditionsSource, PackageReader, PublishClientFactory, VersionLookup};
use crate::orchestration::change_detector::ChangeDetector;
use crate::orchestration::publisher::Publisher;
use crate::orchestration::registry_builder::{GeneratedManifest, RegistryBuilder};
use std::path::Path;
use std::sync::Arc;

/// Name of the run transcript inside the logs directory
pub const RUN_LOG_FILE: &str = "publish-registry.md";

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was added since the last release
    Skipped,
    Published { version: String, dry: bool },
}

/// Orchestrates change detection, generation and publishing
pub struct RegistryPublisher {
    package_name: String,
    detector: ChangeDetector,
    reader: Arc<dyn PackageReader>,
    builder: RegistryBuilder,
    publisher: Publisher,
    clients: Arc<dyn PublishClientFactory>,
}

impl RegistryPublisher {
    pub fn new(
        config: &RegistryConfig,
        reader: Arc<dyn PackageReader>,
        additions: Arc<dyn AdditionsSource>,
        versions: Arc<dyn VersionLookup>,
        clients: Arc<dyn PublishClientFactory>,
    ) -> Self {
        Self {
            package_name: config.package.name.clone(),
            detector: ChangeDetector::new(additions),
            reader,
            builder: RegistryBuilder::new(versions, config.package.clone()),
            publisher: Publisher::new(config.output_path(), config.package.readme.clone()),
            clients,
        }
    }

    /// Publish a new registry release if packages were added
    pub async fn run(&self, dry: bool, log: &mut RunLog) -> Result<RunOutcome, RegistryError> {
        log.log(format!("=== Publishing {} ===", self.package_name));

        if !self.detector.has_new_additions(log).await? {
            return Ok(RunOutcome::Skipped);
        }

        let manifest = self.generate_and_publish_registry(dry, log).await?;
        Ok(RunOutcome::Published {
            version: manifest.version,
            dry,
        })
    }

    /// [`run`](Self::run) with a fresh transcript persisted to
    /// `<logs_dir>/publish-registry.md`
    ///
    /// The transcript is written on failure too, ending in an `Error:` line. A
    /// failure to write it is logged and never replaces the run's own result.
    pub async fn run_and_persist(
        &self,
        dry: bool,
        logs_dir: &Path,
    ) -> Result<RunOutcome, RegistryError> {
        let mut log = RunLog::new();
        tracing::debug!(run_id = %log.run_id(), dry, "starting run");

        let result = self.run(dry, &mut log).await;
        if let Err(e) = &result {
            log.log(format!("Error: {}", e));
        }

        match write_log(logs_dir, RUN_LOG_FILE, &log.finish()).await {
            Ok(path) => tracing::debug!(path = %path.display(), "run log written"),
            Err(e) => tracing::error!("failed to write run log: {}", e),
        }

        result
    }

    /// Build, write and publish the registry package unconditionally
    pub async fn generate_and_publish_registry(
        &self,
        dry: bool,
        log: &mut RunLog,
    ) -> Result<GeneratedManifest, RegistryError> {
        let typings = self.reader.read_typings().await?;
        tracing::debug!(count = typings.len(), "read typings packages");

        let (manifest, document) = self.builder.build(&typings).await?;
        self.publisher.generate(&manifest, &document, log).await?;

        let client = self.clients.create().await?;
        self.publisher
            .publish(client.as_ref(), &manifest, dry, log)
            .await?;

        Ok(manifest)
    }
}
