//! Run logging
//!
//! Console output goes through `tracing`; [`RunLog`] additionally keeps a
//! transcript of the run that is persisted as a markdown file afterwards.

use crate::core::error::RegistryError;
use crate::storage::io::write_text;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install the global console subscriber.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,types_registry_publisher={default_level},publish_registry={default_level}"
        ))
    });

    // A subscriber may already be installed (tests); that is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Line-oriented transcript of a single run
#[derive(Debug, Clone)]
pub struct RunLog {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    lines: Vec<String>,
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            lines: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append a line to the transcript and echo it to the console
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Finish the run and return the full transcript
    pub fn finish(self) -> String {
        let mut transcript = format!(
            "<!-- run {} started {} -->\n\n",
            self.run_id,
            self.started_at.to_rfc3339()
        );
        for line in &self.lines {
            transcript.push_str(line);
            transcript.push('\n');
        }
        transcript
    }
}

/// Persist a transcript as `<logs_dir>/<name>`, returning the written path
pub async fn write_log(logs_dir: &Path, name: &str, transcript: &str) -> Result<PathBuf, RegistryError> {
    let path = logs_dir.join(name);
    write_text(&path, transcript).await?;
    Ok(path)
}
