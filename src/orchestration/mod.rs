//! Orchestration layer for registry publishing
//!
//! Change detection, artifact generation and publishing of the registry
//! package, tied together by [`RegistryPublisher`].

pub mod change_detector;
pub mod publisher;
pub mod registry_builder;
pub mod registry_publisher;

// Re-export main types for convenience
pub use change_detector::ChangeDetector;
pub use publisher::{INDEX_FILE, MANIFEST_FILE, Publisher, README_FILE};
pub use registry_builder::{
    GeneratedManifest, RegistryBuilder, RegistryDocument, generate_manifest, generate_registry,
    next_version,
};
pub use registry_publisher::{RUN_LOG_FILE, RegistryPublisher, RunOutcome};
