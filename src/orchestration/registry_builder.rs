//! Registry Builder - renders the registry package for one run
//!
//! Computes the next version from the last published one and turns the list
//! of typings packages into the manifest and the `index.json` document.

use crate::core::config::{ManifestTemplate, RepositoryConfig};
use crate::core::error::RegistryError;
use crate::core::traits::{TypingsPackage, VersionInfo, VersionLookup};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Major and minor of every registry release; only the patch moves.
const REGISTRY_MAJOR: u64 = 0;
const REGISTRY_MINOR: u64 = 1;

/// Generated `package.json` of the registry package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub repository: RepositoryConfig,
    pub keywords: Vec<String>,
    pub author: String,
    pub license: String,
}

/// Set of package names present in the registry
///
/// Serialized as `{ "entries": { "<name>": 1, ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDocument {
    entries: BTreeSet<String>,
}

impl RegistryDocument {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RegistryDocument {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// `{ "<name>": 1, ... }`
struct Entries<'a>(&'a BTreeSet<String>);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for name in self.0 {
            map.serialize_entry(name, &1u8)?;
        }
        map.end()
    }
}

impl Serialize for RegistryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("entries", &Entries(&self.entries))?;
        map.end()
    }
}

/// Version following the last published one: `0.1.(patch + 1)`
pub fn next_version(last: &VersionInfo) -> semver::Version {
    version_after_patch(last.version.patch)
}

fn version_after_patch(patch: u64) -> semver::Version {
    semver::Version::new(REGISTRY_MAJOR, REGISTRY_MINOR, patch + 1)
}

/// Collect the names of all typings packages; repeated names collapse
pub fn generate_registry(typings: &[TypingsPackage]) -> RegistryDocument {
    typings.iter().map(|t| t.name.as_str()).collect()
}

/// Fill the manifest template with `version`
pub fn generate_manifest(template: &ManifestTemplate, version: &semver::Version) -> GeneratedManifest {
    GeneratedManifest {
        name: template.name.clone(),
        version: version.to_string(),
        description: template.description.clone(),
        repository: template.repository.clone(),
        keywords: template.keywords.clone(),
        author: template.author.clone(),
        license: template.license.clone(),
    }
}

/// Builds the registry package artifacts
pub struct RegistryBuilder {
    versions: Arc<dyn VersionLookup>,
    template: ManifestTemplate,
}

impl RegistryBuilder {
    pub fn new(versions: Arc<dyn VersionLookup>, template: ManifestTemplate) -> Self {
        Self { versions, template }
    }

    /// Patch number of the last published, non-prerelease registry version
    ///
    /// # Errors
    ///
    /// `RegistryError::MissingVersion` if the registry package was never
    /// published.
    pub async fn fetch_last_patch_number(&self) -> Result<u64, RegistryError> {
        let last = self
            .versions
            .fetch_version_info(&self.template.name, true)
            .await?
            .ok_or_else(|| RegistryError::MissingVersion {
                package: self.template.name.clone(),
            })?;
        Ok(last.version.patch)
    }

    /// Render the manifest and registry document for `typings`
    pub async fn build(
        &self,
        typings: &[TypingsPackage],
    ) -> Result<(GeneratedManifest, RegistryDocument), RegistryError> {
        let last_patch = self.fetch_last_patch_number().await?;
        let version = version_after_patch(last_patch);
        tracing::debug!(last_patch, next = %version, "computed registry version");

        let manifest = generate_manifest(&self.template, &version);
        let document = generate_registry(typings);

        Ok((manifest, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedVersion {
        version: Option<&'static str>,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl FixedVersion {
        fn new(version: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                version,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl VersionLookup for FixedVersion {
        async fn fetch_version_info(
            &self,
            package: &str,
            exclude_prerelease: bool,
        ) -> Result<Option<VersionInfo>, RegistryError> {
            self.calls
                .lock()
                .unwrap()
                .push((package.to_string(), exclude_prerelease));
            Ok(self.version.map(|v| VersionInfo {
                version: semver::Version::parse(v).unwrap(),
            }))
        }
    }

    fn typings(names: &[&str]) -> Vec<TypingsPackage> {
        names.iter().map(|n| TypingsPackage::new(*n, "1.0")).collect()
    }

    #[test]
    fn test_next_version_bumps_patch() {
        let last = VersionInfo {
            version: semver::Version::parse("0.1.5").unwrap(),
        };
        assert_eq!(next_version(&last).to_string(), "0.1.6");
    }

    #[test]
    fn test_next_version_ignores_other_components() {
        let last = VersionInfo {
            version: semver::Version::parse("1.4.9").unwrap(),
        };
        assert_eq!(next_version(&last).to_string(), "0.1.10");
    }

    #[test]
    fn test_generate_registry_collapses_duplicates() {
        let document = generate_registry(&typings(&["a", "b", "a"]));

        assert_eq!(document.len(), 2);
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            serde_json::json!({ "entries": { "a": 1, "b": 1 } })
        );
    }

    #[test]
    fn test_generate_registry_empty() {
        let document = generate_registry(&[]);

        assert!(document.is_empty());
        assert_eq!(
            serde_json::to_string(&document).unwrap(),
            r#"{"entries":{}}"#
        );
    }

    #[test]
    fn test_registry_document_serializes_sorted() {
        let document: RegistryDocument = ["node", "jquery", "lodash"].into_iter().collect();

        assert_eq!(
            serde_json::to_string(&document).unwrap(),
            r#"{"entries":{"jquery":1,"lodash":1,"node":1}}"#
        );
        assert_eq!(document.names().collect::<Vec<_>>(), ["jquery", "lodash", "node"]);
    }

    #[test]
    fn test_generate_manifest_shape() {
        let manifest = generate_manifest(
            &ManifestTemplate::default(),
            &semver::Version::new(0, 1, 6),
        );
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["name"], "types-registry");
        assert_eq!(json["version"], "0.1.6");
        assert_eq!(json["repository"]["type"], "git");
        assert_eq!(
            json["repository"]["url"],
            "https://github.com/Microsoft/types-publisher.git"
        );
        assert_eq!(
            json["keywords"],
            serde_json::json!(["TypeScript", "declaration", "files", "types", "packages"])
        );
        assert_eq!(json["author"], "Microsoft Corp.");
        assert_eq!(json["license"], "Apache-2.0");
    }

    #[tokio::test]
    async fn test_build_uses_last_patch() {
        let lookup = FixedVersion::new(Some("0.1.5"));
        let builder = RegistryBuilder::new(lookup.clone(), ManifestTemplate::default());

        let (manifest, document) = builder.build(&typings(&["a", "b", "a"])).await.unwrap();

        assert_eq!(manifest.version, "0.1.6");
        assert!(document.contains("a"));
        assert!(document.contains("b"));
        assert_eq!(
            *lookup.calls.lock().unwrap(),
            vec![("types-registry".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_build_without_published_version_fails() {
        let builder = RegistryBuilder::new(FixedVersion::new(None), ManifestTemplate::default());

        let result = builder.build(&typings(&["a"])).await;

        match result {
            Err(RegistryError::MissingVersion { package }) => assert_eq!(package, "types-registry"),
            other => panic!("expected MissingVersion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_last_patch_number() {
        let builder =
            RegistryBuilder::new(FixedVersion::new(Some("0.1.41")), ManifestTemplate::default());

        assert_eq!(builder.fetch_last_patch_number().await.unwrap(), 41);
    }
}
