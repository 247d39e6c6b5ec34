//! Publisher - stages the registry package on disk and hands it to npm
//!
//! `generate` always starts from an empty output directory so that nothing
//! from a previous run can leak into the published tarball.

use crate::core::error::RegistryError;
use crate::core::logging::RunLog;
use crate::core::traits::PublishClient;
use crate::orchestration::registry_builder::{GeneratedManifest, RegistryDocument};
use crate::storage::io::{clear_output_path, write_json, write_text};
use std::path::PathBuf;

pub const MANIFEST_FILE: &str = "package.json";
pub const INDEX_FILE: &str = "index.json";
pub const README_FILE: &str = "README.md";

/// Writes and publishes the staged registry package
#[derive(Debug, Clone)]
pub struct Publisher {
    output_dir: PathBuf,
    readme: String,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>, readme: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            readme: readme.into(),
        }
    }

    /// Replace the contents of the output directory with the package files
    pub async fn generate(
        &self,
        manifest: &GeneratedManifest,
        document: &RegistryDocument,
        log: &mut RunLog,
    ) -> Result<(), RegistryError> {
        clear_output_path(&self.output_dir).await?;

        write_json(&self.output_dir.join(MANIFEST_FILE), manifest).await?;
        write_json(&self.output_dir.join(INDEX_FILE), document).await?;
        write_text(&self.output_dir.join(README_FILE), &self.readme).await?;

        log.log(format!(
            "Generated {}@{} with {} entries in {}",
            manifest.name,
            manifest.version,
            document.len(),
            self.output_dir.display()
        ));
        Ok(())
    }

    /// Publish the staged directory through `client`
    pub async fn publish(
        &self,
        client: &dyn PublishClient,
        manifest: &GeneratedManifest,
        dry: bool,
        log: &mut RunLog,
    ) -> Result<(), RegistryError> {
        client.publish(&self.output_dir, manifest, dry).await?;

        let prefix = if dry { "(dry) " } else { "" };
        log.log(format!(
            "{}Published {}@{}",
            prefix, manifest.name, manifest.version
        ));
        Ok(())
    }
}
