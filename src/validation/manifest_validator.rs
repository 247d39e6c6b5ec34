//! Manifest Validator - checks a staged package before it is published
//!
//! Runs the same checks npm would reject a publish for (package name rules,
//! SemVer version, required files) so that a dry run exercises them too.
//!
//! # Example
//!
//! ```no_run
//! use types_registry_publisher::validation::ManifestValidator;
//! use std::path::Path;
//!
//! # async fn example(manifest: &types_registry_publisher::orchestration::GeneratedManifest)
//! # -> Result<(), types_registry_publisher::core::RegistryError> {
//! let validator = ManifestValidator::new();
//! let result = validator.validate(Path::new("output/types-registry"), manifest).await?;
//!
//! if result.is_valid {
//!     println!("{} files, {} bytes", result.files.len(), result.total_size);
//! }
//! # Ok(())
//! # }
//! ```

use crate::core::error::RegistryError;
use crate::orchestration::GeneratedManifest;
use crate::storage::io::read_json;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Files every staged registry package must contain
pub const REQUIRED_FILES: &[&str] = &["package.json", "index.json", "README.md"];

const MAX_NAME_LENGTH: usize = 214;

static VALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._-]+$").expect("valid name pattern"));

/// A file that would end up in the published tarball
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFile {
    /// Path relative to the package directory
    pub path: PathBuf,
    pub size: u64,
}

/// Result of manifest validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the package can be published
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings
    pub warnings: Vec<String>,
    /// Files found in the package directory
    pub files: Vec<PackedFile>,
    /// Sum of all file sizes in bytes
    pub total_size: u64,
}

/// Validator for staged registry packages
#[derive(Debug, Default)]
pub struct ManifestValidator;

impl ManifestValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate the package staged in `directory` against `manifest`
    ///
    /// Rule violations end up in the result; only I/O failures are errors.
    pub async fn validate(
        &self,
        directory: &Path,
        manifest: &GeneratedManifest,
    ) -> Result<ValidationResult, RegistryError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        errors.extend(validate_package_name(&manifest.name));

        if semver::Version::parse(&manifest.version).is_err() {
            errors.push(format!("version: invalid SemVer: {}", manifest.version));
        }

        if manifest.license.is_empty() {
            warnings.push("license: missing recommended field".to_string());
        }
        if manifest.description.is_empty() {
            warnings.push("description: missing recommended field".to_string());
        }

        let files = list_package_files(directory)?;
        for required in REQUIRED_FILES {
            if !files.iter().any(|f| f.path == Path::new(required)) {
                errors.push(format!("{}: required file is missing", required));
            }
        }

        // The manifest on disk must be the one we are about to publish
        if errors.is_empty() {
            let on_disk: GeneratedManifest = read_json(&directory.join("package.json")).await?;
            if on_disk.name != manifest.name || on_disk.version != manifest.version {
                errors.push(format!(
                    "package.json: staged {}@{} does not match {}@{}",
                    on_disk.name, on_disk.version, manifest.name, manifest.version
                ));
            }
        }

        let total_size = files.iter().map(|f| f.size).sum();

        Ok(ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            files,
            total_size,
        })
    }
}

/// Check a package name against npm naming rules
pub fn validate_package_name(name: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("name: required".to_string());
        return errors;
    }

    if name.len() > MAX_NAME_LENGTH {
        errors.push(format!("name: must be at most {} characters", MAX_NAME_LENGTH));
    }

    let name_without_scope = match name.strip_prefix('@') {
        Some(scoped) => scoped.split_once('/').map(|(_, n)| n).unwrap_or(""),
        None => name,
    };

    if !VALID_NAME_CHARS.is_match(name_without_scope) {
        errors.push(
            "name: only lowercase letters, digits, '-', '_' and '.' are allowed".to_string(),
        );
    }

    if name_without_scope.starts_with('.') || name_without_scope.starts_with('_') {
        errors.push("name: must not start with '.' or '_'".to_string());
    }

    errors
}

/// List all regular files below `directory`, sorted by relative path
fn list_package_files(directory: &Path) -> Result<Vec<PackedFile>, RegistryError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(directory).to_path_buf();
            RegistryError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let size = entry
            .metadata()
            .map_err(|e| RegistryError::io(entry.path(), e.into()))?
            .len();
        let path = entry
            .path()
            .strip_prefix(directory)
            .unwrap_or(entry.path())
            .to_path_buf();

        files.push(PackedFile { path, size });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ManifestTemplate;
    use crate::orchestration::generate_manifest;
    use tempfile::TempDir;

    fn manifest(version: &str) -> GeneratedManifest {
        let mut manifest = generate_manifest(
            &ManifestTemplate::default(),
            &semver::Version::new(0, 1, 0),
        );
        manifest.version = version.to_string();
        manifest
    }

    fn stage(dir: &Path, manifest: &GeneratedManifest) {
        std::fs::write(
            dir.join("package.json"),
            serde_json::to_string(manifest).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.join("index.json"), r#"{"entries":{}}"#).unwrap();
        std::fs::write(dir.join("README.md"), "readme").unwrap();
    }

    #[test]
    fn test_validate_package_name_valid() {
        assert!(validate_package_name("types-registry").is_empty());
    }

    #[test]
    fn test_validate_package_name_scoped() {
        assert!(validate_package_name("@types/node").is_empty());
    }

    #[test]
    fn test_validate_package_name_uppercase() {
        let errors = validate_package_name("TypesRegistry");
        assert!(!errors.is_empty());
        assert!(errors[0].starts_with("name:"));
    }

    #[test]
    fn test_validate_package_name_too_long() {
        assert!(!validate_package_name(&"a".repeat(215)).is_empty());
    }

    #[test]
    fn test_validate_package_name_starts_with_dot() {
        assert!(!validate_package_name(".registry").is_empty());
    }

    #[test]
    fn test_validate_package_name_empty() {
        assert_eq!(validate_package_name(""), vec!["name: required"]);
    }

    #[tokio::test]
    async fn test_validate_staged_package() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = manifest("0.1.6");
        stage(temp_dir.path(), &manifest);

        let result = ManifestValidator::new()
            .validate(temp_dir.path(), &manifest)
            .await
            .unwrap();

        assert!(result.is_valid, "errors: {:?}", result.errors);
        let paths: Vec<_> = result.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("index.json"),
                PathBuf::from("package.json"),
            ]
        );
        assert!(result.total_size > 0);
    }

    #[tokio::test]
    async fn test_validate_missing_required_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = manifest("0.1.6");
        stage(temp_dir.path(), &manifest);
        std::fs::remove_file(temp_dir.path().join("index.json")).unwrap();

        let result = ManifestValidator::new()
            .validate(temp_dir.path(), &manifest)
            .await
            .unwrap();

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.starts_with("index.json")));
    }

    #[tokio::test]
    async fn test_validate_invalid_semver() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = manifest("0.1");
        stage(temp_dir.path(), &manifest);

        let result = ManifestValidator::new()
            .validate(temp_dir.path(), &manifest)
            .await
            .unwrap();

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.starts_with("version:")));
    }

    #[tokio::test]
    async fn test_validate_stale_manifest_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &manifest("0.1.5"));

        let result = ManifestValidator::new()
            .validate(temp_dir.path(), &manifest("0.1.6"))
            .await
            .unwrap();

        assert!(!result.is_valid);
        assert!(result.errors[0].contains("does not match"));
    }
}
