//! Low-level file helpers
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never observes a half-written file.

use crate::core::error::RegistryError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` atomically, creating parent directories
pub async fn write_text(path: &Path, contents: &str) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RegistryError::io(parent, e))?;
    }

    let temp_file = temp_path(path);
    fs::write(&temp_file, contents)
        .await
        .map_err(|e| RegistryError::io(&temp_file, e))?;
    fs::rename(&temp_file, path)
        .await
        .map_err(|e| RegistryError::io(path, e))?;

    Ok(())
}

/// Serialize `content` as pretty JSON and write it atomically
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, content: &T) -> Result<(), RegistryError> {
    let mut json = serde_json::to_string_pretty(content).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    json.push('\n');

    write_text(path, &json).await
}

/// Read and deserialize a JSON file
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| RegistryError::io(path, e))?;

    serde_json::from_str(&content).map_err(|e| RegistryError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Remove `path` recursively (if present) and recreate it empty
pub async fn clear_output_path(path: &Path) -> Result<(), RegistryError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(RegistryError::io(path, e)),
    }

    fs::create_dir_all(path)
        .await
        .map_err(|e| RegistryError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_json_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("data.json");

        write_json(&path, &serde_json::json!({ "entries": { "jquery": 1 } }))
            .await
            .unwrap();

        let written: serde_json::Value = read_json(&path).await.unwrap();
        assert_eq!(written["entries"]["jquery"], 1);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_text_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("README.md");

        write_text(&path, "old contents that are longer").await.unwrap();
        write_text(&path, "new").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_read_json_reports_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = read_json::<serde_json::Value>(&path).await;
        assert!(matches!(result, Err(RegistryError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_read_json_missing_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = read_json::<serde_json::Value>(&temp_dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }

    #[tokio::test]
    async fn test_clear_output_path_removes_stale_files() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("types-registry");
        std::fs::create_dir_all(out.join("nested")).unwrap();
        std::fs::write(out.join("stale.txt"), "stale").unwrap();
        std::fs::write(out.join("nested").join("old.json"), "{}").unwrap();

        clear_output_path(&out).await.unwrap();

        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_clear_output_path_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("never-created");

        clear_output_path(&out).await.unwrap();
        clear_output_path(&out).await.unwrap();

        assert!(out.is_dir());
    }
}
