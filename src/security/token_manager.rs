//! Secure npm token handling with masking capabilities
//!
//! The token is held as a `secrecy::SecretString` from the moment it is read,
//! so it cannot leak through `Debug` output or logs by accident.

use crate::core::error::RegistryError;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::path::PathBuf;

/// Resolves the npm auth token from an environment variable or a token file
///
/// # Examples
///
/// ```no_run
/// use types_registry_publisher::security::SecureTokenManager;
///
/// # async fn example() -> Result<(), types_registry_publisher::core::RegistryError> {
/// let manager = SecureTokenManager::new("NPM_TOKEN", None);
/// if let Some(token) = manager.get_token().await? {
///     println!("npm token found: {}", SecureTokenManager::mask_token(&token));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    env_var: String,
    token_file: Option<PathBuf>,
}

impl SecureTokenManager {
    pub fn new(env_var: impl Into<String>, token_file: Option<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            token_file,
        }
    }

    /// Retrieve the token
    ///
    /// The environment variable wins over the token file. Returns `None` when
    /// neither is set; a configured but unreadable token file is an error.
    pub async fn get_token(&self) -> Result<Option<SecretString>, RegistryError> {
        if let Ok(value) = env::var(&self.env_var)
            && !value.trim().is_empty()
        {
            return Ok(Some(SecretString::from(value.trim().to_string())));
        }

        let Some(path) = &self.token_file else {
            return Ok(None);
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegistryError::io(path, e))?;
        let token = content.trim();

        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SecretString::from(token.to_string())))
        }
    }

    /// Mask a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters; tokens shorter than 10
    /// characters are fully masked as "****".
    pub fn mask_token(token: &SecretString) -> String {
        let token = token.expose_secret();
        if token.chars().count() < 10 {
            return "****".to_string();
        }

        let prefix: String = token.chars().take(3).collect();
        let suffix: String = token.chars().skip(token.chars().count() - 3).collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Replace every occurrence of `token` in `text` with its masked form
    pub fn mask_token_in_string(text: &str, token: &SecretString) -> String {
        let secret = token.expose_secret();
        if secret.is_empty() {
            return text.to_string();
        }

        text.replace(secret, &Self::mask_token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[tokio::test]
    async fn test_get_token_from_env_var() {
        unsafe {
            env::set_var("TYPES_REGISTRY_TEST_TOKEN_ENV", "test-npm-token-12345");
        }
        let manager = SecureTokenManager::new("TYPES_REGISTRY_TEST_TOKEN_ENV", None);
        let token = manager.get_token().await.unwrap();
        assert_eq!(token.unwrap().expose_secret(), "test-npm-token-12345");
        unsafe {
            env::remove_var("TYPES_REGISTRY_TEST_TOKEN_ENV");
        }
    }

    #[tokio::test]
    async fn test_get_token_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let token_file = temp_dir.path().join("npm-token");
        std::fs::write(&token_file, "file-token-abcdef\n").unwrap();

        let manager =
            SecureTokenManager::new("TYPES_REGISTRY_TEST_TOKEN_UNSET_1", Some(token_file));
        let token = manager.get_token().await.unwrap();
        assert_eq!(token.unwrap().expose_secret(), "file-token-abcdef");
    }

    #[tokio::test]
    async fn test_get_token_none_when_not_configured() {
        let manager = SecureTokenManager::new("TYPES_REGISTRY_TEST_TOKEN_UNSET_2", None);
        assert!(manager.get_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_token_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SecureTokenManager::new(
            "TYPES_REGISTRY_TEST_TOKEN_UNSET_3",
            Some(temp_dir.path().join("missing")),
        );

        let result = manager.get_token().await;
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }

    #[test]
    fn test_mask_token_with_short_token() {
        assert_eq!(SecureTokenManager::mask_token(&secret("short")), "****");
        assert_eq!(SecureTokenManager::mask_token(&secret("")), "****");
    }

    #[test]
    fn test_mask_token_with_long_token() {
        assert_eq!(SecureTokenManager::mask_token(&secret("abcdef123456")), "abc...456");
        assert_eq!(
            SecureTokenManager::mask_token(&secret("very-long-token-string")),
            "ver...ing"
        );
    }

    #[test]
    fn test_mask_token_in_string() {
        let token = secret("secret-npm-token-12345");
        let output = SecureTokenManager::mask_token_in_string(
            "npm ERR! 401 token secret-npm-token-12345 rejected",
            &token,
        );
        assert!(output.contains("sec...345"));
        assert!(!output.contains("secret-npm-token-12345"));
    }

    #[test]
    fn test_mask_token_in_string_no_token_present() {
        let input = "This is a safe string with no tokens";
        assert_eq!(
            SecureTokenManager::mask_token_in_string(input, &secret("abcdefghijkl")),
            input
        );
    }
}
