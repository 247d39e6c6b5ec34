//! Configuration structures for the registry publisher
//!
//! Every section has defaults, so an empty (or absent) config file yields a
//! working setup that publishes `types-registry` from `./output`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported schema version
pub const CONFIG_SCHEMA_VERSION: &str = "1.0";

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Schema version
    pub version: String,

    /// Filesystem locations
    pub paths: PathsConfig,

    /// Static metadata of the generated package
    pub package: ManifestTemplate,

    /// npm registry access
    pub npm: NpmConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_SCHEMA_VERSION.to_string(),
            paths: PathsConfig::default(),
            package: ManifestTemplate::default(),
            npm: NpmConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Staging directory of the generated package (`<outputRoot>/<name>`)
    pub fn output_path(&self) -> PathBuf {
        self.paths.output_root.join(&self.package.name)
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Root under which generated packages are staged
    #[serde(rename = "outputRoot")]
    pub output_root: PathBuf,

    /// Directory holding typesData.json and additions.json
    #[serde(rename = "dataDir")]
    pub data_dir: PathBuf,

    /// Directory run logs are written to
    #[serde(rename = "logsDir")]
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl PathsConfig {
    /// Resolve relative paths against `base`
    pub fn resolve(&mut self, base: &Path) {
        for path in [&mut self.output_root, &mut self.data_dir, &mut self.logs_dir] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Repository descriptor of package.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

/// Static fields of the generated package manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManifestTemplate {
    pub name: String,
    pub description: String,
    pub repository: RepositoryConfig,
    pub keywords: Vec<String>,
    pub author: String,
    pub license: String,

    /// Contents of the generated README.md
    pub readme: String,
}

impl Default for ManifestTemplate {
    fn default() -> Self {
        Self {
            name: "types-registry".to_string(),
            description: "A registry of TypeScript declaration file packages published within the @types scope.".to_string(),
            repository: RepositoryConfig {
                kind: "git".to_string(),
                url: "https://github.com/Microsoft/types-publisher.git".to_string(),
            },
            keywords: ["TypeScript", "declaration", "files", "types", "packages"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            author: "Microsoft Corp.".to_string(),
            license: "Apache-2.0".to_string(),
            readme: "This package contains a listing of all packages published to the @types scope on NPM.\n\
                     Generated by [types-publisher](https://github.com/Microsoft/types-publisher).\n"
                .to_string(),
        }
    }
}

/// npm registry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NpmConfig {
    /// Registry base URL (default: "https://registry.npmjs.org")
    #[serde(rename = "registryUrl")]
    pub registry_url: String,

    /// Environment variable holding the auth token (default: "NPM_TOKEN")
    #[serde(rename = "tokenEnv")]
    pub token_env: String,

    /// File containing the auth token, used when the env var is unset
    #[serde(skip_serializing_if = "Option::is_none", rename = "tokenFile")]
    pub token_file: Option<PathBuf>,

    /// Timeout for `npm publish` in seconds (default: 300)
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,

    /// Retry policy for registry metadata lookups
    pub retry: RetryConfig,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            registry_url: "https://registry.npmjs.org".to_string(),
            token_env: "NPM_TOKEN".to_string(),
            token_file: None,
            timeout_secs: 300,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy for registry metadata lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    #[serde(rename = "maxAttempts")]
    pub max_attempts: u32,

    #[serde(rename = "initialDelayMs")]
    pub initial_delay_ms: u64,

    #[serde(rename = "maxDelayMs")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}
