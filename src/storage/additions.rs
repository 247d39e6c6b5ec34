//! Reader for the additions record
//!
//! `additions.json` holds the package names published for the first time
//! since the registry package was last published. The upstream publish step
//! writes it; this crate only reads it.

use crate::core::error::RegistryError;
use crate::core::traits::AdditionsSource;
use crate::storage::io::read_json;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File name of the additions record inside the data directory
pub const ADDITIONS_FILE: &str = "additions.json";

/// Reads additions from `<data_dir>/additions.json`
#[derive(Debug, Clone)]
pub struct FsAdditionsSource {
    path: PathBuf,
}

impl FsAdditionsSource {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(ADDITIONS_FILE),
        }
    }
}

#[async_trait]
impl AdditionsSource for FsAdditionsSource {
    async fn read_additions(&self) -> Result<Vec<String>, RegistryError> {
        // No record yet means nothing was added.
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| RegistryError::io(&self.path, e))?
        {
            return Ok(Vec::new());
        }

        read_json(&self.path).await
    }
}
