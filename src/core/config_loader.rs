//! Configuration file loader for the registry publisher
//!
//! This module provides configuration loading, overriding, `${VAR}` expansion
//! and validation.

use super::config::*;
use crate::core::error::RegistryError;
use crate::validation::validate_package_name;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".types-registry.yaml";

/// Environment variable pattern (${VAR_NAME})
static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Values given on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_root: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
}

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Directory relative paths are resolved against
    pub project_path: PathBuf,

    /// Explicit config file; `<project_path>/.types-registry.yaml` otherwise
    pub config_file: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli: CliOverrides,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "npm.registryUrl")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Config file (explicit, or ./.types-registry.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<RegistryConfig, RegistryError> {
        let explicit = options.config_file.is_some();
        let config_path = options
            .config_file
            .clone()
            .unwrap_or_else(|| options.project_path.join(CONFIG_FILENAME));

        // 4 + 3. Defaults, overlaid by the file through serde defaults
        let mut config = match Self::load_config_file(&config_path).await? {
            Some(config) => config,
            None if explicit => {
                return Err(RegistryError::Config(format!(
                    "config file not found: {}",
                    config_path.display()
                )));
            }
            None => RegistryConfig::default(),
        };

        // 2. Environment variables
        Self::apply_env(&mut config, &options.env);

        // 1. CLI arguments
        Self::apply_cli(&mut config, options.cli);

        let mut config = Self::expand_env_vars(config, &options.env);
        config.paths.resolve(&options.project_path);
        if let Some(token_file) = config.npm.token_file.as_mut()
            && token_file.is_relative()
        {
            *token_file = options.project_path.join(&*token_file);
        }

        let validation = Self::validate(&config);
        for warning in &validation.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        if !validation.valid {
            return Err(RegistryError::Config(Self::format_validation_result(
                &validation,
            )));
        }

        Ok(config)
    }

    /// Load configuration from a YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<RegistryConfig>, RegistryError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path)
            .await
            .map_err(|e| RegistryError::io(file_path, e))?;

        let config: RegistryConfig = serde_yaml::from_str(&content).map_err(|e| {
            RegistryError::Config(format!(
                "failed to parse {}: {}",
                file_path.display(),
                e
            ))
        })?;

        Ok(Some(config))
    }

    /// Apply overrides from environment variables
    fn apply_env(config: &mut RegistryConfig, env: &HashMap<String, String>) {
        // TYPES_REGISTRY_OUTPUT_PATH -> paths.outputRoot
        if let Some(output) = env.get("TYPES_REGISTRY_OUTPUT_PATH") {
            config.paths.output_root = PathBuf::from(output);
        }

        // TYPES_REGISTRY_DATA_DIR -> paths.dataDir
        if let Some(data_dir) = env.get("TYPES_REGISTRY_DATA_DIR") {
            config.paths.data_dir = PathBuf::from(data_dir);
        }

        // TYPES_REGISTRY_LOGS_DIR -> paths.logsDir
        if let Some(logs_dir) = env.get("TYPES_REGISTRY_LOGS_DIR") {
            config.paths.logs_dir = PathBuf::from(logs_dir);
        }

        // NPM_REGISTRY_URL -> npm.registryUrl
        if let Some(url) = env.get("NPM_REGISTRY_URL") {
            config.npm.registry_url = url.clone();
        }
    }

    /// Apply overrides from the command line
    fn apply_cli(config: &mut RegistryConfig, cli: CliOverrides) {
        if let Some(output_root) = cli.output_root {
            config.paths.output_root = output_root;
        }
        if let Some(data_dir) = cli.data_dir {
            config.paths.data_dir = data_dir;
        }
        if let Some(logs_dir) = cli.logs_dir {
            config.paths.logs_dir = logs_dir;
        }
    }

    /// Expand `${VAR}` references in paths, registry URL and token file
    fn expand_env_vars(mut config: RegistryConfig, env: &HashMap<String, String>) -> RegistryConfig {
        let expand_path = |path: &PathBuf| PathBuf::from(Self::expand_string(&path.to_string_lossy(), env));

        config.paths.output_root = expand_path(&config.paths.output_root);
        config.paths.data_dir = expand_path(&config.paths.data_dir);
        config.paths.logs_dir = expand_path(&config.paths.logs_dir);
        config.npm.registry_url = Self::expand_string(&config.npm.registry_url, env);
        config.npm.token_file = config.npm.token_file.as_ref().map(expand_path);

        config
    }

    /// Expand environment variables in a single string
    ///
    /// Unknown variables are left in place.
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        ENV_VAR_PATTERN
            .replace_all(input, |cap: &regex::Captures| match env.get(&cap[1]) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!("Environment variable {} not found", &cap[1]);
                    cap[0].to_string()
                }
            })
            .into_owned()
    }

    /// Validate configuration
    pub fn validate(config: &RegistryConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Schema version
        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
            });
        } else if config.version != CONFIG_SCHEMA_VERSION {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some(format!(
                    "Currently supported version is \"{}\" only",
                    CONFIG_SCHEMA_VERSION
                )),
            });
        }

        // 2. Package template
        Self::validate_package(&config.package, &mut errors, &mut warnings);

        // 3. npm settings
        Self::validate_npm(&config.npm, &mut errors, &mut warnings);

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn validate_package(
        package: &ManifestTemplate,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        if package.name.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "package.name".to_string(),
                message: "name is required".to_string(),
            });
        } else {
            for message in validate_package_name(&package.name) {
                errors.push(ConfigValidationError {
                    field: "package.name".to_string(),
                    message,
                });
            }

            // The output directory is `<outputRoot>/<name>` and gets cleared recursively
            if !Path::new(&package.name)
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
            {
                errors.push(ConfigValidationError {
                    field: "package.name".to_string(),
                    message: format!(
                        "{:?} must stay inside paths.outputRoot",
                        package.name
                    ),
                });
            }
        }

        if package.license.trim().is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "package.license".to_string(),
                message: "license is empty".to_string(),
                suggestion: Some("Set package.license (e.g. \"Apache-2.0\")".to_string()),
            });
        }

        if package.readme.trim().is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "package.readme".to_string(),
                message: "README.md will be empty".to_string(),
                suggestion: None,
            });
        }
    }

    fn validate_npm(
        npm: &NpmConfig,
        errors: &mut Vec<ConfigValidationError>,
        _warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        if let Err(e) = reqwest::Url::parse(&npm.registry_url) {
            errors.push(ConfigValidationError {
                field: "npm.registryUrl".to_string(),
                message: format!("invalid URL {:?}: {}", npm.registry_url, e),
            });
        }

        if npm.token_env.is_empty() {
            errors.push(ConfigValidationError {
                field: "npm.tokenEnv".to_string(),
                message: "tokenEnv is required".to_string(),
            });
        }

        if npm.timeout_secs == 0 {
            errors.push(ConfigValidationError {
                field: "npm.timeoutSecs".to_string(),
                message: "timeoutSecs must be greater than 0".to_string(),
            });
        }

        if npm.retry.max_attempts == 0 {
            errors.push(ConfigValidationError {
                field: "npm.retry.maxAttempts".to_string(),
                message: "maxAttempts must be at least 1".to_string(),
            });
        }
    }

    /// Format validation result for display
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        for error in &result.errors {
            lines.push(format!("[{}] {}", error.field, error.message));
        }
        for warning in &result.warnings {
            match &warning.suggestion {
                Some(suggestion) => lines.push(format!(
                    "warning [{}] {} ({})",
                    warning.field, warning.message, suggestion
                )),
                None => lines.push(format!("warning [{}] {}", warning.field, warning.message)),
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(project: &Path) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: project.to_path_buf(),
            config_file: None,
            cli: CliOverrides::default(),
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_load_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(options(temp_dir.path())).await.unwrap();

        assert_eq!(config.paths.output_root, temp_dir.path().join("output"));
        assert_eq!(
            config.output_path(),
            temp_dir.path().join("output").join("types-registry")
        );
    }

    #[tokio::test]
    async fn test_load_project_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "paths:\n  dataDir: shared/data\npackage:\n  author: Someone\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(temp_dir.path())).await.unwrap();

        assert_eq!(config.paths.data_dir, temp_dir.path().join("shared/data"));
        assert_eq!(config.package.author, "Someone");
        assert_eq!(config.package.license, "Apache-2.0");
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = options(temp_dir.path());
        opts.config_file = Some(temp_dir.path().join("nope.yaml"));

        let result = ConfigLoader::load(opts).await;
        assert!(matches!(result, Err(RegistryError::Config(_))));
    }

    #[tokio::test]
    async fn test_priority_file_env_cli() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "paths:\n  outputRoot: from-file\n  dataDir: from-file-data\n  logsDir: from-file-logs\n",
        )
        .unwrap();

        let mut opts = options(temp_dir.path());
        opts.env.insert(
            "TYPES_REGISTRY_OUTPUT_PATH".to_string(),
            "/env/output".to_string(),
        );
        opts.env
            .insert("TYPES_REGISTRY_DATA_DIR".to_string(), "/env/data".to_string());
        opts.cli.output_root = Some(PathBuf::from("/cli/output"));

        let config = ConfigLoader::load(opts).await.unwrap();

        assert_eq!(config.paths.output_root, PathBuf::from("/cli/output"));
        assert_eq!(config.paths.data_dir, PathBuf::from("/env/data"));
        assert_eq!(config.paths.logs_dir, temp_dir.path().join("from-file-logs"));
    }

    #[tokio::test]
    async fn test_invalid_registry_url_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = options(temp_dir.path());
        opts.env
            .insert("NPM_REGISTRY_URL".to_string(), "not a url".to_string());

        let result = ConfigLoader::load(opts).await;
        match result {
            Err(RegistryError::Config(message)) => assert!(message.contains("npm.registryUrl")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_string() {
        let mut env = HashMap::new();
        env.insert("SECRETS_DIR".to_string(), "/run/secrets".to_string());

        let result = ConfigLoader::expand_string("${SECRETS_DIR}/npm", &env);
        assert_eq!(result, "/run/secrets/npm");
    }

    #[test]
    fn test_expand_string_keeps_unknown_variables() {
        let result = ConfigLoader::expand_string("${UNKNOWN_VAR}/npm", &HashMap::new());
        assert_eq!(result, "${UNKNOWN_VAR}/npm");
    }

    #[test]
    fn test_validate_version_required() {
        let config = RegistryConfig {
            version: String::new(),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "version");
    }

    #[test]
    fn test_validate_unknown_version_warning() {
        let config = RegistryConfig {
            version: "2.0".to_string(),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = RegistryConfig::default();
        config.npm.timeout_secs = 0;

        let result = ConfigLoader::validate(&config);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.field == "npm.timeoutSecs"));
    }

    #[test]
    fn test_validate_rejects_parent_directory_name() {
        for name in ["..", "../..", "@x/../../y", "/abs"] {
            let mut config = RegistryConfig::default();
            config.package.name = name.to_string();

            let result = ConfigLoader::validate(&config);
            assert!(!result.valid, "{:?} accepted", name);
            assert!(result.errors.iter().all(|e| e.field == "package.name"));
        }
    }

    #[test]
    fn test_validate_accepts_scoped_name() {
        let mut config = RegistryConfig::default();
        config.package.name = "@types/registry".to_string();

        assert!(ConfigLoader::validate(&config).valid);
    }

    #[tokio::test]
    async fn test_load_rejects_name_outside_output_root() {
        let temp_dir = TempDir::new().unwrap();
        let precious = temp_dir.path().join("work").join("precious.txt");
        std::fs::create_dir_all(temp_dir.path().join("work").join("output")).unwrap();
        std::fs::write(&precious, "keep").unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "paths:\n  outputRoot: work/output\npackage:\n  name: \"..\"\n",
        )
        .unwrap();

        let result = ConfigLoader::load(options(temp_dir.path())).await;

        match result {
            Err(RegistryError::Config(message)) => assert!(message.contains("package.name")),
            other => panic!("expected config error, got {:?}", other),
        }
        assert!(precious.exists());
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigValidationResult {
            valid: false,
            errors: vec![ConfigValidationError {
                field: "package.name".to_string(),
                message: "name is required".to_string(),
            }],
            warnings: vec![ConfigValidationWarning {
                field: "version".to_string(),
                message: "Unknown version: 2.0".to_string(),
                suggestion: None,
            }],
        };

        let formatted = ConfigLoader::format_validation_result(&result);
        assert!(formatted.contains("[package.name] name is required"));
        assert!(formatted.contains("warning [version] Unknown version: 2.0"));
    }
}
