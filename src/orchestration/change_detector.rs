//! Change Detector - decides whether a new registry release is needed

use crate::core::error::RegistryError;
use crate::core::logging::RunLog;
use crate::core::traits::AdditionsSource;
use std::sync::Arc;

/// Checks the additions recorded since the last registry publish
pub struct ChangeDetector {
    additions: Arc<dyn AdditionsSource>,
}

impl ChangeDetector {
    pub fn new(additions: Arc<dyn AdditionsSource>) -> Self {
        Self { additions }
    }

    /// True iff at least one package was added since the last publish
    pub async fn has_new_additions(&self, log: &mut RunLog) -> Result<bool, RegistryError> {
        let additions = self.additions.read_additions().await?;

        if additions.is_empty() {
            log.log("No new packages published, so no need to publish new registry.");
            return Ok(false);
        }

        let names = serde_json::to_string(&additions).map_err(|e| RegistryError::Parse {
            path: "additions".into(),
            message: e.to_string(),
        })?;
        log.log(format!(
            "New packages have been added: {}, so publishing a new registry",
            names
        ));
        Ok(true)
    }
}
