//! Reader for the typings data file produced by the package parser
//!
//! `typesData.json` maps every package name to the data versions stored for
//! it. Not-needed packages are kept in a separate file and never show up here.

use crate::core::error::RegistryError;
use crate::core::traits::{PackageReader, TypingsPackage};
use crate::storage::io::read_json;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the typings data inside the data directory
pub const TYPES_DATA_FILE: &str = "typesData.json";

/// `{ "<name>": { "<dataVersion>": { ... } } }`
type TypesData = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Reads typings packages from `<data_dir>/typesData.json`
#[derive(Debug, Clone)]
pub struct FsPackageReader {
    path: PathBuf,
}

impl FsPackageReader {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TYPES_DATA_FILE),
        }
    }
}

#[async_trait]
impl PackageReader for FsPackageReader {
    async fn read_typings(&self) -> Result<Vec<TypingsPackage>, RegistryError> {
        let data: TypesData = read_json(&self.path).await?;

        let typings = data
            .into_iter()
            .flat_map(|(name, versions)| {
                versions
                    .into_keys()
                    .map(move |version| TypingsPackage::new(name.clone(), version))
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = typings.len(), path = %self.path.display(), "read typings");
        Ok(typings)
    }
}
