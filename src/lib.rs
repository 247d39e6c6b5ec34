//! types-registry publisher
//!
//! Publishes the `types-registry` npm package: a listing of every package
//! published to the `@types` scope. A new patch release is made only when
//! packages were added since the last one.

pub mod core;
pub mod npm;
pub mod orchestration;
pub mod security;
pub mod storage;
pub mod validation;

pub use crate::core::*;
pub use npm::{NpmClient, NpmClientFactory, NpmRegistryClient};
pub use orchestration::{
    ChangeDetector, GeneratedManifest, Publisher, RegistryBuilder, RegistryDocument,
    RegistryPublisher, RunOutcome,
};
pub use security::{CommandError, SafeCommandExecutor, SecureTokenManager};
pub use storage::{FsAdditionsSource, FsPackageReader};
pub use validation::ManifestValidator;
